//! Turn pipeline outcome and stage types.

use serde::{Deserialize, Serialize};

/// Stages of one turn, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    Validating,
    Masking,
    Retrieving,
    Assembling,
    Completing,
    Recording,
    Done,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Masking => "masking",
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::Completing => "completing",
            Self::Recording => "recording",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// The externally observable outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub reply_text: String,
    pub pii_masked: bool,
    pub context_retrieved: bool,
}
