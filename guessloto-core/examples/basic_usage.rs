use guessloto_core::{GameConfig, LotoServices};
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // WALLET_ADDRESS and ETHERSCAN_API_KEY come from the environment
    let config = GameConfig::from_env()?;

    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    let services = LotoServices::new(config, temp_dir.path())?;

    let reading = services.accumulator.total_received().await;
    if let Some(warning) = &reading.warning {
        println!("Ledger unavailable: {}", warning);
    }
    let split = services.accumulator.split(reading.total);
    println!("Pot wallet has received {:.6} ETH", reading.total);
    println!(
        "Winner would take {:.6} ETH, {:.6} ETH rolls over",
        split.winner_share, split.rollover
    );

    if let Some(sender) = std::env::args().nth(1) {
        let check = services.verifier.check(&sender).await;
        println!("Payment check for {}: {:?}", sender, check);
    }

    Ok(())
}
