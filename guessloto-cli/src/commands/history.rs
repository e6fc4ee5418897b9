use crate::commands::emit;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use guessloto_game::GuessLoto;

pub async fn show_guesses(game: &GuessLoto, limit: usize, cli_config: &CliConfig) -> anyhow::Result<()> {
    let guesses = game.services().guesses.recent(limit).await;
    emit(cli_config, &guesses, |guesses| {
        if guesses.is_empty() {
            println!("No guesses yet.");
            return;
        }
        let line: Vec<String> = guesses.iter().map(|g| g.to_string()).collect();
        println!("Recent guesses: {}", line.join(" | "));
    })
}

pub async fn show_winners(game: &GuessLoto, limit: usize, cli_config: &CliConfig) -> anyhow::Result<()> {
    let winners = game.services().winners.recent(limit).await;
    emit(cli_config, &winners, |winners| {
        if winners.is_empty() {
            println!("No winners yet.");
            return;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Winner", "Amount (ETH)", "When"]);
        for entry in winners {
            table.add_row(vec![
                entry.winner.clone(),
                format!("{:.6}", entry.amount),
                entry
                    .recorded_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!("{}", table);
    })
}
