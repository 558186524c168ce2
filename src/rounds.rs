//! Static challenge table and flag validation.

use crate::types::RoundId;

/// How a round's completion reaches the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveChannel {
    /// Flag typed into the main page and checked by `submit_flag`
    Inline,
    /// Confirmed by the advanced challenge page through the completion inbox
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDefinition {
    pub id: RoundId,
    pub title: &'static str,
    pub flag: &'static str,
    pub points: u32,
    pub channel: SolveChannel,
}

pub const ROUNDS: [RoundDefinition; 5] = [
    RoundDefinition {
        id: 1,
        title: "PDF Forensics",
        flag: "PPG{PDF_FORENSICS}",
        points: 10,
        channel: SolveChannel::Inline,
    },
    RoundDefinition {
        id: 2,
        title: "Image EXIF",
        flag: "PPG{IMAGE_EXIF_MASTER}",
        points: 10,
        channel: SolveChannel::Inline,
    },
    RoundDefinition {
        id: 3,
        title: "Cryptography",
        flag: "PPG{CRYPTO_MASTER}",
        points: 10,
        channel: SolveChannel::Inline,
    },
    RoundDefinition {
        id: 4,
        title: "QR Analysis",
        flag: "PPG{QR_ANALYSIS_COMPLETE}",
        points: 10,
        channel: SolveChannel::Inline,
    },
    RoundDefinition {
        id: 5,
        title: "Advanced Challenge",
        flag: "PPG{ADVANCED_CHALLENGE_COMPLETE}",
        points: 20,
        channel: SolveChannel::External,
    },
];

pub const TOTAL_ROUNDS: usize = ROUNDS.len();

/// Round whose completion arrives through the completion inbox
pub const EXTERNAL_ROUND: RoundId = 5;

/// Look up a round definition
pub fn round(id: RoundId) -> Option<&'static RoundDefinition> {
    ROUNDS.iter().find(|r| r.id == id)
}

/// Points awarded for a round (0 for ids outside the table)
pub fn points_for(id: RoundId) -> u32 {
    round(id).map(|r| r.points).unwrap_or(0)
}

/// Check a submitted flag against the table.
///
/// Surrounding whitespace is ignored; everything else is an exact,
/// case-sensitive match. Unknown rounds never validate.
pub fn validate(id: RoundId, submitted: &str) -> bool {
    round(id).is_some_and(|r| submitted.trim() == r.flag)
}

/// Whether text has the `PPG{A-Z0-9_}` shape of a flag
pub fn looks_like_flag(text: &str) -> bool {
    let Some(body) = text
        .trim()
        .strip_prefix("PPG{")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return false;
    };

    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_exact_flag() {
        assert!(validate(1, "PPG{PDF_FORENSICS}"));
        assert!(validate(5, "PPG{ADVANCED_CHALLENGE_COMPLETE}"));
    }

    #[test]
    fn test_validate_trims_whitespace() {
        assert!(validate(3, "  PPG{CRYPTO_MASTER}\n"));
    }

    #[test]
    fn test_validate_is_case_sensitive() {
        assert!(!validate(1, "ppg{pdf_forensics}"));
        assert!(!validate(1, "PPG{PDF_Forensics}"));
    }

    #[test]
    fn test_validate_rejects_other_rounds_flag() {
        assert!(!validate(2, "PPG{PDF_FORENSICS}"));
        assert!(!validate(1, "PPG{WRONG}"));
    }

    #[test]
    fn test_unknown_round_never_validates() {
        assert!(!validate(0, "PPG{PDF_FORENSICS}"));
        assert!(!validate(6, ""));
        assert_eq!(points_for(42), 0);
    }

    #[test]
    fn test_advanced_round_is_double_points() {
        assert_eq!(points_for(EXTERNAL_ROUND), 20);
        assert_eq!(round(EXTERNAL_ROUND).unwrap().channel, SolveChannel::External);
        assert!(ROUNDS[..4].iter().all(|r| r.points == 10));
    }

    #[test]
    fn test_looks_like_flag() {
        assert!(looks_like_flag("PPG{WRONG}"));
        assert!(looks_like_flag("PPG{ABC_123}"));
        assert!(!looks_like_flag("PPG{}"));
        assert!(!looks_like_flag("PPG{lower}"));
        assert!(!looks_like_flag("FLAG{ABC}"));
        assert!(!looks_like_flag("PPG{ABC"));
    }
}
