pub mod pot;
pub mod verifier;

pub use pot::{sum_qualifying, PotAccumulator, PotCache, PotReading};
pub use verifier::{find_payment, PaymentCheck, PaymentVerifier};

use crate::types::Wei;

/// EIP-681 payment request that wallets and QR renderers understand.
pub fn payment_uri(address: &str, amount: Wei) -> String {
    format!("ethereum:{}?value={}", address.trim(), amount.as_wei())
}
