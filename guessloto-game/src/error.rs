use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Guess Loto core error: {0}")]
    Core(#[from] guessloto_core::LotoError),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session {0} has not verified a payment yet")]
    PaymentRequired(Uuid),
}
