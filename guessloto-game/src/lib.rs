//! Guess Loto rounds
//!
//! Each visitor gets a session holding a secret number. Guesses are checked
//! against it, logged to the shared guess ledger and grow the pot; the winner
//! takes a fixed share and the rest rolls over to the next round.

pub mod error;
pub mod game;
pub mod session;
pub mod store;
pub mod views;

pub use error::{GameError, Result};
pub use game::GuessLoto;
pub use session::{GameSession, GuessOutcome, GuessRange, GuessRejection, RoundState};
pub use store::SessionStore;
pub use views::{GameView, GuessReport, PaywallView};

use guessloto_core::{GameConfig, LotoServices};
use std::path::Path;

/// Open a game backed by the block explorer, with sessions stored in `data_dir`.
pub async fn open_game(config: GameConfig, data_dir: &Path) -> Result<GuessLoto> {
    let services = LotoServices::new(config, data_dir)?;
    let sessions = SessionStore::open(data_dir.join(store::SESSIONS_FILE)).await;
    Ok(GuessLoto::new(services, sessions))
}
