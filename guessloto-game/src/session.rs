use chrono::{DateTime, Utc};
use guessloto_core::PotCache;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::{IntErrorKind, ParseIntError};
use uuid::Uuid;

pub const NUMBER_RANGE_MIN: u64 = 1;
pub const NUMBER_RANGE_MAX: u64 = 100_000_000_000;

/// Inclusive bounds for the secret and for accepted guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRange {
    pub min: u64,
    pub max: u64,
}

impl Default for GuessRange {
    fn default() -> Self {
        Self {
            min: NUMBER_RANGE_MIN,
            max: NUMBER_RANGE_MAX,
        }
    }
}

impl GuessRange {
    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.min..=self.max)
    }

    /// Parse user input into an in-range guess.
    pub fn parse(&self, input: &str) -> Result<u64, GuessRejection> {
        let out_of_range = GuessRejection::OutOfRange {
            min: self.min,
            max: self.max,
        };

        // integers too long for i128 are still integers, just out of range
        let value: i128 = input.trim().parse().map_err(|e: ParseIntError| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range.clone(),
            _ => GuessRejection::NotANumber,
        })?;

        match u64::try_from(value) {
            Ok(v) if self.contains(v) => Ok(v),
            _ => Err(out_of_range),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    AwaitingGuess,
    RoundComplete,
}

/// Why a guess was turned away. None of these touch any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuessRejection {
    NotANumber,
    OutOfRange { min: u64, max: u64 },
    RoundOver,
}

impl fmt::Display for GuessRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuessRejection::NotANumber => write!(f, "Please enter a valid number"),
            GuessRejection::OutOfRange { min, max } => {
                write!(f, "Guess must be between {} and {}", min, max)
            }
            GuessRejection::RoundOver => write!(f, "This round is over, start a new one to keep playing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuessOutcome {
    Correct { attempts: u32 },
    Incorrect { attempts: u32 },
    Rejected(GuessRejection),
}

/// One player's round: the secret, their guesses so far, and their paywall status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    id: Uuid,
    secret: u64,
    attempts: u32,
    history: Vec<u64>,
    state: RoundState,
    range: GuessRange,
    paid_by: Option<String>,
    pot_cache: PotCache,
    created_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new(range: GuessRange) -> Self {
        Self::new_with_rng(range, &mut rand::thread_rng())
    }

    pub fn new_with_rng<R: Rng + ?Sized>(range: GuessRange, rng: &mut R) -> Self {
        Self {
            id: Uuid::new_v4(),
            secret: range.draw(rng),
            attempts: 0,
            history: Vec::new(),
            state: RoundState::AwaitingGuess,
            range,
            paid_by: None,
            pot_cache: PotCache::default(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn secret(&self) -> u64 {
        self.secret
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn range(&self) -> GuessRange {
        self.range
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_complete(&self) -> bool {
        self.state == RoundState::RoundComplete
    }

    pub fn paid_by(&self) -> Option<&str> {
        self.paid_by.as_deref()
    }

    pub fn is_unlocked(&self) -> bool {
        self.paid_by.is_some()
    }

    pub fn unlock(&mut self, payer: impl Into<String>) {
        self.paid_by = Some(payer.into());
    }

    pub fn pot_cache(&self) -> &PotCache {
        &self.pot_cache
    }

    pub fn pot_cache_mut(&mut self) -> &mut PotCache {
        &mut self.pot_cache
    }

    /// Check a raw guess against the range and the round state.
    pub fn validate(&self, input: &str) -> Result<u64, GuessRejection> {
        if self.is_complete() {
            return Err(GuessRejection::RoundOver);
        }
        self.range.parse(input)
    }

    /// Apply an already persisted guess to the round.
    pub fn record_guess(&mut self, guess: u64) -> GuessOutcome {
        if self.is_complete() {
            return GuessOutcome::Rejected(GuessRejection::RoundOver);
        }
        if !self.range.contains(guess) {
            return GuessOutcome::Rejected(GuessRejection::OutOfRange {
                min: self.range.min,
                max: self.range.max,
            });
        }

        self.attempts += 1;
        self.history.push(guess);

        if guess == self.secret {
            self.state = RoundState::RoundComplete;
            tracing::info!("Session {} solved in {} attempts", self.id, self.attempts);
            GuessOutcome::Correct {
                attempts: self.attempts,
            }
        } else {
            GuessOutcome::Incorrect {
                attempts: self.attempts,
            }
        }
    }

    /// Start a fresh round. Payment status and the pot cache carry over.
    pub fn reset(&mut self) {
        self.reset_with_rng(&mut rand::thread_rng());
    }

    pub fn reset_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.secret = self.range.draw(rng);
        self.attempts = 0;
        self.history.clear();
        self.state = RoundState::AwaitingGuess;
        tracing::info!("Session {} started a new round", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> GameSession {
        GameSession::new_with_rng(GuessRange::default(), &mut StdRng::seed_from_u64(42))
    }

    fn wrong_guess(s: &GameSession) -> u64 {
        if s.secret() == NUMBER_RANGE_MIN {
            NUMBER_RANGE_MIN + 1
        } else {
            NUMBER_RANGE_MIN
        }
    }

    #[test]
    fn test_new_session_awaits_guess() {
        let s = session();
        assert_eq!(s.state(), RoundState::AwaitingGuess);
        assert_eq!(s.attempts(), 0);
        assert!(s.history().is_empty());
        assert!(GuessRange::default().contains(s.secret()));
        assert!(!s.is_unlocked());
    }

    #[test]
    fn test_range_bounds() {
        let range = GuessRange::default();
        assert_eq!(range.parse("1"), Ok(NUMBER_RANGE_MIN));
        assert_eq!(range.parse("100000000000"), Ok(NUMBER_RANGE_MAX));
        assert_eq!(range.parse(" +17 "), Ok(17));

        let out = Err(GuessRejection::OutOfRange {
            min: NUMBER_RANGE_MIN,
            max: NUMBER_RANGE_MAX,
        });
        assert_eq!(range.parse("0"), out);
        assert_eq!(range.parse("100000000001"), out);
        assert_eq!(range.parse("-5"), out);

        assert_eq!(range.parse(""), Err(GuessRejection::NotANumber));
        assert_eq!(range.parse("12.5"), Err(GuessRejection::NotANumber));
        assert_eq!(range.parse("abc"), Err(GuessRejection::NotANumber));
    }

    #[test]
    fn test_huge_integers_are_out_of_range() {
        let range = GuessRange::default();
        let out = Err(GuessRejection::OutOfRange {
            min: NUMBER_RANGE_MIN,
            max: NUMBER_RANGE_MAX,
        });

        let huge = "9".repeat(60);
        assert_eq!(range.parse(&huge), out);
        assert_eq!(range.parse(&format!("-{}", huge)), out);
        assert_eq!(range.parse(&format!("x{}", huge)), Err(GuessRejection::NotANumber));
    }

    #[test]
    fn test_rejected_input_leaves_session_untouched() {
        let s = session();
        assert!(s.validate("0").is_err());
        assert!(s.validate("100000000001").is_err());
        assert!(s.validate("seven").is_err());
        assert_eq!(s.attempts(), 0);
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_wrong_guess_keeps_round_open() {
        let mut s = session();
        let guess = wrong_guess(&s);

        assert_eq!(s.record_guess(guess), GuessOutcome::Incorrect { attempts: 1 });
        assert_eq!(s.state(), RoundState::AwaitingGuess);
        assert_eq!(s.history(), &[guess]);
    }

    #[test]
    fn test_exact_secret_completes_round() {
        let mut s = session();
        let wrong = wrong_guess(&s);
        s.record_guess(wrong);

        let secret = s.secret();
        assert_eq!(s.record_guess(secret), GuessOutcome::Correct { attempts: 2 });
        assert!(s.is_complete());
        assert_eq!(s.history(), &[wrong, secret]);

        // no more guesses until reset
        assert_eq!(s.validate("5"), Err(GuessRejection::RoundOver));
        assert_eq!(
            s.record_guess(5),
            GuessOutcome::Rejected(GuessRejection::RoundOver)
        );
        assert_eq!(s.attempts(), 2);
    }

    #[test]
    fn test_reset_clears_round_but_keeps_payment() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = GameSession::new_with_rng(GuessRange::default(), &mut rng);
        s.unlock("0xplayer");
        let secret = s.secret();
        s.record_guess(secret);

        s.reset_with_rng(&mut rng);
        assert_eq!(s.state(), RoundState::AwaitingGuess);
        assert_eq!(s.attempts(), 0);
        assert!(s.history().is_empty());
        assert_eq!(s.paid_by(), Some("0xplayer"));
    }

    #[test]
    fn test_reset_draws_uniformly() {
        let mut rng = StdRng::seed_from_u64(2024);
        let range = GuessRange::default();
        let mut s = GameSession::new_with_rng(range, &mut rng);

        const DRAWS: usize = 20_000;
        const BUCKETS: usize = 10;
        let width = (range.max - range.min + 1) / BUCKETS as u64;
        let mut counts = [0usize; BUCKETS];

        for _ in 0..DRAWS {
            s.reset_with_rng(&mut rng);
            let secret = s.secret();
            assert!(range.contains(secret));
            let bucket = (((secret - range.min) / width) as usize).min(BUCKETS - 1);
            counts[bucket] += 1;
        }

        // expected 2000 per bucket, standard deviation about 42
        for count in counts {
            assert!((1_700..=2_300).contains(&count), "bucket count {} is skewed", count);
        }
    }

    #[test]
    fn test_small_range_hits_both_ends() {
        let range = GuessRange { min: 1, max: 3 };
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[(range.draw(&mut rng) - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }
}
