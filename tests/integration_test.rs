use chrono::{Duration, Utc};
use ppg_ctf::config::GameConfig;
use ppg_ctf::error::GameError;
use ppg_ctf::protocol::{ClientMessage, ServerMessage};
use ppg_ctf::state::{AppState, SubmitOutcome};
use ppg_ctf::store::{LocalStorage, PersistedSession, SessionStore};
use ppg_ctf::types::TimerPhase;
use ppg_ctf::ws::handlers::handle_message;
use std::sync::Arc;

fn app_with(store: Arc<LocalStorage>) -> Arc<AppState> {
    Arc::new(AppState::new(GameConfig::default(), store.clone(), store))
}

fn stored_team(name: &str, solved: Vec<u8>, total: u32) -> PersistedSession {
    PersistedSession {
        team_name: name.to_string(),
        solved_rounds: solved,
        total_score: total,
        ..PersistedSession::default()
    }
}

/// End-to-end flow for a single team
#[tokio::test]
async fn test_full_game_flow() {
    let store = Arc::new(LocalStorage::in_memory());
    let state = app_with(store.clone());

    // 1. Register
    let snapshot = state.register_team("Alpha").await.unwrap();
    assert_eq!(snapshot.phase, TimerPhase::NotStarted);
    assert_eq!(snapshot.time_remaining, 5400);

    // 2. Flags are refused until the countdown runs
    assert_eq!(
        state.submit_flag(1, "PPG{PDF_FORENSICS}").await,
        Err(GameError::NotStarted)
    );

    // 3. Start and solve round 1
    state.start_timer(false).await.unwrap();
    assert_eq!(
        state.start_timer(false).await,
        Err(GameError::AlreadyRunning)
    );

    let outcome = state.submit_flag(1, "PPG{PDF_FORENSICS}").await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Correct {
            points: 10,
            total_score: 10
        }
    );

    let stored = store.get("Alpha").await.unwrap().unwrap();
    assert_eq!(stored.total_score, 10);
    assert_eq!(stored.solved_rounds, vec![1]);
    assert_eq!(stored.submissions.len(), 1);
    assert!(stored.timer_running);

    // 4. A wrong flag changes nothing
    let outcome = state.submit_flag(2, "PPG{NOT_IT}").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Incorrect { well_formed: true });
    assert_eq!(state.snapshot().await.total_score, 10);

    // 5. Reset is blocked while the countdown runs
    assert_eq!(state.reset_game("RESET").await, Err(GameError::ResetBlocked));

    // 6. The leaderboard shows the team
    let rows = state.compute_ranking().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Alpha");
    assert_eq!(rows[0].score, 10);

    state.shutdown().await;
}

#[tokio::test]
async fn test_countdown_expired_while_away() {
    let store = Arc::new(LocalStorage::in_memory());
    store.set_active_team(Some("Alpha")).await.unwrap();
    store
        .put(
            "Alpha",
            &PersistedSession {
                time_remaining: Some(5400),
                timer_running: true,
                last_updated: Some(Utc::now() - Duration::seconds(6000)),
                ..stored_team("Alpha", vec![1], 10)
            },
        )
        .await
        .unwrap();
    let state = app_with(store.clone());
    let mut rx = state.broadcast.subscribe();

    let snapshot = state.restore().await.unwrap();

    assert_eq!(snapshot.phase, TimerPhase::Expired);
    assert_eq!(snapshot.time_remaining, 0);
    assert_eq!(snapshot.total_score, 10);

    let mut game_over = None;
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::GameOver { summary } = msg {
            game_over = Some(summary);
        }
    }
    let summary = game_over.expect("GameOver should be broadcast");
    assert_eq!(summary.team, "Alpha");
    assert_eq!(summary.score, 10);

    let stored = store.get("Alpha").await.unwrap().unwrap();
    assert_eq!(stored.time_remaining, Some(0));
    assert!(!stored.timer_running);

    assert_eq!(
        state.submit_flag(2, "PPG{IMAGE_EXIF_MASTER}").await,
        Err(GameError::TimeExpired)
    );
    assert_eq!(state.start_timer(false).await, Err(GameError::TimeExpired));
}

#[tokio::test]
async fn test_reset_can_be_used_once() {
    let store = Arc::new(LocalStorage::in_memory());
    store.set_active_team(Some("Alpha")).await.unwrap();
    store
        .put("Alpha", &stored_team("Alpha", vec![1, 2], 20))
        .await
        .unwrap();
    let state = app_with(store.clone());
    state.restore().await.unwrap();

    assert_eq!(state.reset_game("reset").await, Err(GameError::ResetCancelled));
    assert_eq!(state.snapshot().await.total_score, 20);

    state.reset_game("RESET").await.unwrap();
    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.total_score, 0);
    assert!(snapshot.solved_rounds.is_empty());
    assert!(snapshot.reset_used);
    assert_eq!(snapshot.time_remaining, 5400);

    assert_eq!(
        state.reset_game("RESET").await,
        Err(GameError::ResetAlreadyUsed)
    );
    let stored = store.get("Alpha").await.unwrap().unwrap();
    assert!(stored.reset_used);
    assert!(stored.submissions.is_empty());
}

#[tokio::test]
async fn test_leaderboard_ordering() {
    let store = Arc::new(LocalStorage::in_memory());
    store.put("C", &stored_team("C", vec![5, 1, 2], 40)).await.unwrap();
    store
        .put("B", &stored_team("B", vec![1, 2, 3, 4, 5], 60))
        .await
        .unwrap();
    store
        .put("A", &stored_team("A", vec![1, 2, 3, 4, 5], 60))
        .await
        .unwrap();
    let state = app_with(store);

    let rows = state.compute_ranking().await;

    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(rows[2].score, 40);
}

#[tokio::test]
async fn test_stored_total_is_recomputed_from_rounds() {
    let store = Arc::new(LocalStorage::in_memory());
    store.put("Liar", &stored_team("Liar", vec![1], 999)).await.unwrap();
    let state = app_with(store);

    let rows = state.compute_ranking().await;

    assert_eq!(rows[0].score, 10);
}

#[tokio::test]
async fn test_websocket_message_flow() {
    let state = app_with(Arc::new(LocalStorage::in_memory()));
    let mut rx = state.broadcast.subscribe();

    let response = handle_message(
        ClientMessage::RegisterTeam {
            name: "Alpha".to_string(),
        },
        &state,
    )
    .await;
    assert!(matches!(response, Some(ServerMessage::SessionState { .. })));

    assert!(handle_message(ClientMessage::StartTimer, &state)
        .await
        .is_none());

    let response = handle_message(
        ClientMessage::SubmitFlag {
            round: 3,
            flag: "PPG{CRYPTO_MASTER}".to_string(),
        },
        &state,
    )
    .await;
    assert!(response.is_none());

    // Resubmitting comes back to the caller as a warning notice
    let response = handle_message(
        ClientMessage::SubmitFlag {
            round: 3,
            flag: "PPG{CRYPTO_MASTER}".to_string(),
        },
        &state,
    )
    .await;
    match response {
        Some(ServerMessage::Notice { code, .. }) => {
            assert_eq!(code.as_deref(), Some("ALREADY_SOLVED"));
        }
        other => panic!("Expected notice, got {:?}", other),
    }

    let mut solved = None;
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::RoundSolved {
            round,
            points,
            total_score,
            progress_percent,
        } = msg
        {
            solved = Some((round, points, total_score, progress_percent));
        }
    }
    assert_eq!(solved, Some((3, 10, 10, 20)));

    match handle_message(ClientMessage::RequestState, &state).await {
        Some(ServerMessage::SessionState { session }) => {
            assert_eq!(session.phase, TimerPhase::Running);
            assert_eq!(session.solved_rounds, vec![3]);
        }
        other => panic!("Expected session state, got {:?}", other),
    }

    state.shutdown().await;
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctf_storage.json");

    {
        let store = Arc::new(LocalStorage::open(&path).await.unwrap());
        let state = app_with(store);
        state.register_team("Alpha").await.unwrap();
        state.start_timer(false).await.unwrap();
        state.submit_flag(4, "PPG{QR_ANALYSIS_COMPLETE}").await.unwrap();
        // Leaves no ticker running against the file once this state is gone
        state.shutdown().await;
    }

    let store = Arc::new(LocalStorage::open(&path).await.unwrap());
    let state = app_with(store);
    let snapshot = state.restore().await.expect("team should be restored");

    assert_eq!(snapshot.team.as_deref(), Some("Alpha"));
    assert_eq!(snapshot.total_score, 10);
    assert_eq!(snapshot.solved_rounds, vec![4]);
    assert_eq!(snapshot.phase, TimerPhase::Running);
    assert!(snapshot.time_remaining <= 5400);
    assert!(snapshot.time_remaining >= 5390);

    state.shutdown().await;
}
