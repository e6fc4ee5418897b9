use crate::commands::emit;
use crate::commands::paywall::print_paywall;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Input};
use guessloto_game::{GameView, GuessLoto, GuessOutcome, GuessReport, RoundState};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
struct SessionSummary {
    id: Uuid,
    state: RoundState,
    attempts: u32,
    unlocked: bool,
    created_at: String,
}

pub async fn new_session(game: &GuessLoto, cli_config: &CliConfig) -> anyhow::Result<()> {
    let session = game.create_session().await?;
    let id = session.id();

    if cli_config.json {
        let view = game.paywall_view(id).await?;
        return emit(cli_config, &view, |_| {});
    }

    println!("Session ID: {}", id);
    println!();
    if game.is_unlocked(id)? {
        println!("The paywall is off. Start guessing: guessloto play {}", id);
    } else {
        let view = game.paywall_view(id).await?;
        print_paywall(&view);
        println!();
        println!("After paying, run: guessloto verify {} <your address>", id);
    }
    Ok(())
}

pub async fn submit_guess(
    game: &GuessLoto,
    session: Uuid,
    value: &str,
    cli_config: &CliConfig,
) -> anyhow::Result<()> {
    let report = game.submit_guess(session, value).await?;
    emit(cli_config, &report, print_report)
}

fn print_report(report: &GuessReport) {
    match &report.outcome {
        GuessOutcome::Correct { attempts } => {
            println!("Correct! You guessed it in {} attempts.", attempts);
            if let Some(payout) = &report.payout {
                println!(
                    "You win {:.6} ETH. {:.6} ETH rolls over to the next round.",
                    payout.winner_share, payout.rollover
                );
            }
        }
        GuessOutcome::Incorrect { .. } => println!("Incorrect. Try again!"),
        GuessOutcome::Rejected(reason) => println!("{}", reason),
    }
    if let Some(pot) = report.pot {
        println!("Current pot: {:.6} ETH", pot);
    }
}

pub async fn reset_session(game: &GuessLoto, session: Uuid, cli_config: &CliConfig) -> anyhow::Result<()> {
    game.reset(session).await?;
    let view = game.game_view(session).await?;
    emit(cli_config, &view, |_| println!("New round started. Good luck!"))
}

pub async fn show_status(game: &GuessLoto, session: Uuid, cli_config: &CliConfig) -> anyhow::Result<()> {
    let view = game.game_view(session).await?;
    emit(cli_config, &view, print_game)
}

fn print_game(view: &GameView) {
    if !view.recent_guesses.is_empty() {
        let ticker: Vec<String> = view.recent_guesses.iter().map(|g| g.to_string()).collect();
        println!("Recent guesses: {}", ticker.join(" | "));
        println!();
    }

    println!(
        "Guess a number between {} and {}.",
        view.range.min, view.range.max
    );
    println!("Current pot: {:.6} ETH", view.contribution_pot);
    println!();

    match view.state {
        RoundState::AwaitingGuess => {
            if view.history.is_empty() {
                println!("No guesses this round yet.");
            } else {
                let history: Vec<String> = view.history.iter().map(|g| g.to_string()).collect();
                println!("Your guesses: {}", history.join(" "));
            }
        }
        RoundState::RoundComplete => {
            println!("You guessed it in {} attempts!", view.attempts);
            let history: Vec<String> = view.history.iter().map(|g| g.to_string()).collect();
            println!("Your guess history: {}", history.join(", "));
        }
    }
}

pub fn list_sessions(game: &GuessLoto, cli_config: &CliConfig) -> anyhow::Result<()> {
    let summaries: Vec<SessionSummary> = game
        .sessions()
        .list()
        .into_iter()
        .map(|s| SessionSummary {
            id: s.id(),
            state: s.state(),
            attempts: s.attempts(),
            unlocked: s.is_unlocked(),
            created_at: s.created_at().format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    emit(cli_config, &summaries, |summaries| {
        if summaries.is_empty() {
            println!("No sessions. Start one with 'guessloto new'.");
            return;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Session", "State", "Attempts", "Paid", "Created"]);
        for s in summaries {
            table.add_row(vec![
                s.id.to_string(),
                format!("{:?}", s.state),
                s.attempts.to_string(),
                if s.unlocked { "yes" } else { "no" }.to_string(),
                s.created_at.clone(),
            ]);
        }
        println!("{}", table);
    })
}

/// Prompt for guesses until the player quits.
pub async fn play(game: &GuessLoto, session: Uuid) -> anyhow::Result<()> {
    if !game.is_unlocked(session)? {
        let view = game.paywall_view(session).await?;
        print_paywall(&view);
        return Ok(());
    }

    println!("Enter a number to guess, or 'q' to quit.");
    loop {
        let view = game.game_view(session).await?;

        if view.state == RoundState::RoundComplete {
            print_game(&view);
            let again = Confirm::new()
                .with_prompt("Play again?")
                .default(true)
                .interact()?;
            if !again {
                break;
            }
            game.reset(session).await?;
            println!("New round started. Good luck!");
            continue;
        }

        let input: String = Input::new()
            .with_prompt("Enter your guess (numbers only)")
            .allow_empty(true)
            .interact_text()?;
        if input.trim().eq_ignore_ascii_case("q") {
            break;
        }

        let report = game.submit_guess(session, &input).await?;
        print_report(&report);
    }

    Ok(())
}
