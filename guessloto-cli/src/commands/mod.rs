pub mod history;
pub mod paywall;
pub mod round;

pub use history::{show_guesses, show_winners};
pub use paywall::{show_paywall, verify_payment};
pub use round::{list_sessions, new_session, play, reset_session, show_status, submit_guess};

use crate::config::CliConfig;
use serde::Serialize;

/// Print `value` as JSON when `--json` is set, otherwise run the human renderer.
pub(crate) fn emit<T: Serialize>(
    cli_config: &CliConfig,
    value: &T,
    human: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if cli_config.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}
