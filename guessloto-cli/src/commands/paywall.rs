use crate::commands::emit;
use crate::config::CliConfig;
use guessloto_core::PaymentCheck;
use guessloto_game::{GuessLoto, PaywallView};
use uuid::Uuid;

pub async fn show_paywall(game: &GuessLoto, session: Uuid, cli_config: &CliConfig) -> anyhow::Result<()> {
    let view = game.paywall_view(session).await?;
    emit(cli_config, &view, print_paywall)
}

pub(crate) fn print_paywall(view: &PaywallView) {
    if view.unlocked {
        println!("Session {} is unlocked. Go guess!", view.session_id);
    } else {
        println!("Access locked");
        println!(
            "To play, send at least {} ETH to:",
            view.min_amount
        );
        println!("  {}", view.wallet_address);
        println!("Payment request (for QR codes): {}", view.payment_uri);
    }
    println!();

    match &view.pot_warning {
        Some(warning) => println!("Unable to fetch pot size: {}", warning),
        None => println!("Current pot: {:.6} ETH", view.pot),
    }
    println!(
        "Guess a number between {} and {}. Winner takes {}%, the rest rolls over.",
        view.range.min,
        view.range.max,
        view.pot_split.winner_percent()
    );

    if !view.recent_winners.is_empty() {
        println!();
        println!("Previous winners:");
        for entry in &view.recent_winners {
            println!("  - {} won {} ETH", entry.winner, entry.amount);
        }
    }
}

pub async fn verify_payment(
    game: &GuessLoto,
    session: Uuid,
    address: &str,
    cli_config: &CliConfig,
) -> anyhow::Result<()> {
    let check = game.verify_payment(session, address).await?;
    emit(cli_config, &check, |check| match check {
        PaymentCheck::Confirmed { tx_hash, value } => {
            println!("Payment confirmed! ({} ETH in {})", value, tx_hash);
            println!("You can now play: guessloto play {}", session);
        }
        PaymentCheck::NotFound => println!("Payment not found for this address."),
        PaymentCheck::Unavailable { reason } => {
            println!("Payment check failed: {}", reason);
            println!("Try again in a moment.");
        }
        PaymentCheck::InvalidAddress => println!("Enter your wallet address to verify payment."),
    })
}
