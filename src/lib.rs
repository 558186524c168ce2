// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod countdown;
pub mod error;
pub mod ledger;
pub mod protocol;
pub mod rounds;
pub mod session;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
