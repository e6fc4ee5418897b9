use crate::error::{LotoError, Result};
use crate::types::{Wei, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";
pub const DEFAULT_WINNER_SHARE_BPS: u32 = 8_800;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub wallet_address: String,
    pub etherscan_url: String,
    #[serde(default, skip_serializing)]
    pub etherscan_api_key: String,
    /// Passphrase for the winners file. `None` keeps it in plain JSON.
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
    pub min_amount: Wei,
    pub contribution_per_guess: Wei,
    pub winner_share_bps: u32,
    pub pot_refresh_interval: Duration,
    pub request_timeout: Duration,
    pub paywall_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            wallet_address: String::new(),
            etherscan_url: DEFAULT_ETHERSCAN_URL.to_string(),
            etherscan_api_key: String::new(),
            secret_key: None,
            min_amount: Wei::from_wei(100_000_000_000_000), // 0.0001 ETH
            contribution_per_guess: Wei::from_wei(100_000_000_000_000),
            winner_share_bps: DEFAULT_WINNER_SHARE_BPS,
            pot_refresh_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            paywall_enabled: true,
        }
    }
}

impl GameConfig {
    pub fn new(wallet_address: impl Into<String>, etherscan_api_key: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            etherscan_api_key: etherscan_api_key.into(),
            ..Self::default()
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(wallet) = get("WALLET_ADDRESS") {
            config.wallet_address = wallet;
        }
        if let Some(key) = get("ETHERSCAN_API_KEY") {
            config.etherscan_api_key = key;
        }
        if let Some(url) = get("ETHERSCAN_URL") {
            config.etherscan_url = url;
        }
        config.secret_key = get("SECRET_KEY");

        if let Some(min) = get("MIN_AMOUNT_ETH") {
            config.min_amount = Wei::from_eth_str(&min)
                .map_err(|e| LotoError::config(format!("MIN_AMOUNT_ETH: {}", e)))?;
        }
        if let Some(contribution) = get("CONTRIBUTION_PER_GUESS_ETH") {
            config.contribution_per_guess = Wei::from_eth_str(&contribution)
                .map_err(|e| LotoError::config(format!("CONTRIBUTION_PER_GUESS_ETH: {}", e)))?;
        }
        if let Some(bps) = get("WINNER_SHARE_BPS") {
            config.winner_share_bps = bps
                .parse()
                .map_err(|e| LotoError::config(format!("WINNER_SHARE_BPS: {}", e)))?;
        }
        if let Some(secs) = get("POT_REFRESH_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| LotoError::config(format!("POT_REFRESH_SECS: {}", e)))?;
            config.pot_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(paywall) = get("GUESSLOTO_PAYWALL") {
            config.paywall_enabled = !matches!(
                paywall.to_ascii_lowercase().as_str(),
                "off" | "0" | "false" | "no"
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wallet_address.trim().is_empty() {
            return Err(LotoError::config("WALLET_ADDRESS cannot be empty"));
        }

        if self.paywall_enabled && self.etherscan_api_key.trim().is_empty() {
            return Err(LotoError::config(
                "ETHERSCAN_API_KEY is required while the paywall is enabled",
            ));
        }

        if self.etherscan_url.is_empty() {
            return Err(LotoError::config("Etherscan URL cannot be empty"));
        }

        if self.min_amount.is_zero() {
            return Err(LotoError::config("Minimum payment must be greater than 0"));
        }

        if self.winner_share_bps > BPS_DENOMINATOR {
            return Err(LotoError::config(format!(
                "Winner share of {} bps exceeds {}",
                self.winner_share_bps, BPS_DENOMINATOR
            )));
        }

        if self.pot_refresh_interval.is_zero() {
            return Err(LotoError::config("Pot refresh interval must be greater than 0"));
        }

        Ok(())
    }
}
