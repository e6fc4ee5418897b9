use crate::session::{GuessOutcome, GuessRange, RoundState};
use chrono::{DateTime, Utc};
use guessloto_core::{PotSplit, Wei, WinnerRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a locked-out visitor sees: where to pay and what is at stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaywallView {
    pub session_id: Uuid,
    pub unlocked: bool,
    pub wallet_address: String,
    pub min_amount: Wei,
    pub payment_uri: String,
    pub pot: Wei,
    pub pot_split: PotSplit,
    pub pot_warning: Option<String>,
    pub pot_fetched_at: Option<DateTime<Utc>>,
    pub recent_winners: Vec<WinnerRecord>,
    pub range: GuessRange,
}

/// The game page for an unlocked session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub session_id: Uuid,
    pub state: RoundState,
    pub attempts: u32,
    pub history: Vec<u64>,
    pub recent_guesses: Vec<u64>,
    pub contribution_pot: Wei,
    pub pot_split: PotSplit,
    pub paid_by: Option<String>,
    pub range: GuessRange,
}

/// Result of one submitted guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessReport {
    pub outcome: GuessOutcome,
    /// Contribution pot after this guess, `None` when the guess was rejected.
    pub pot: Option<Wei>,
    /// Present when the guess won the round.
    pub payout: Option<PotSplit>,
}
