use crate::error::{GameError, Result};
use crate::session::{GameSession, GuessOutcome, GuessRange};
use crate::store::SessionStore;
use crate::views::{GameView, GuessReport, PaywallView};
use chrono::Utc;
use guessloto_core::payment::payment_uri;
use guessloto_core::storage::guess_store::RECENT_GUESS_LIMIT;
use guessloto_core::storage::winner_store::RECENT_WINNER_LIMIT;
use guessloto_core::{LotoServices, PaymentCheck, PotSplit, Wei};
use uuid::Uuid;

/// Name recorded for winners of sessions that never went through the paywall.
pub const ANONYMOUS_WINNER: &str = "anonymous";

/// Ties sessions to the payment checks, pot and shared ledgers.
pub struct GuessLoto {
    services: LotoServices,
    sessions: SessionStore,
    range: GuessRange,
}

impl GuessLoto {
    pub fn new(services: LotoServices, sessions: SessionStore) -> Self {
        Self {
            services,
            sessions,
            range: GuessRange::default(),
        }
    }

    pub fn with_range(mut self, range: GuessRange) -> Self {
        self.range = range;
        self
    }

    pub fn services(&self) -> &LotoServices {
        &self.services
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn create_session(&self) -> Result<GameSession> {
        let session = GameSession::new(self.range);
        tracing::info!("Created session {}", session.id());
        self.sessions.insert(session.clone()).await?;
        Ok(session)
    }

    pub fn session(&self, id: Uuid) -> Result<GameSession> {
        self.sessions.get(id)
    }

    pub fn is_unlocked(&self, id: Uuid) -> Result<bool> {
        let session = self.sessions.get(id)?;
        Ok(!self.services.config.paywall_enabled || session.is_unlocked())
    }

    /// Check the ledger for a payment from `sender` and unlock the session on success.
    pub async fn verify_payment(&self, id: Uuid, sender: &str) -> Result<PaymentCheck> {
        let _round = self.sessions.lock(id).await;
        // fail fast on unknown sessions before hitting the network
        self.sessions.get(id)?;

        let check = self.services.verifier.check(sender).await;
        if check.is_confirmed() {
            let payer = sender.trim().to_string();
            self.sessions.update(id, |s| s.unlock(payer)).await?;
            tracing::info!("Session {} unlocked", id);
        }
        Ok(check)
    }

    /// Submit raw guess input for a session.
    ///
    /// The whole submission runs under the session lock. The guess and its
    /// contribution are written to the shared ledgers before the session
    /// changes, so a storage failure leaves the round as it was.
    pub async fn submit_guess(&self, id: Uuid, input: &str) -> Result<GuessReport> {
        let _round = self.sessions.lock(id).await;
        let session = self.sessions.get(id)?;
        if self.services.config.paywall_enabled && !session.is_unlocked() {
            return Err(GameError::PaymentRequired(id));
        }

        let guess = match session.validate(input) {
            Ok(guess) => guess,
            Err(rejection) => {
                tracing::debug!("Session {} rejected input {:?}: {}", id, input, rejection);
                return Ok(GuessReport {
                    outcome: GuessOutcome::Rejected(rejection),
                    pot: None,
                    payout: None,
                });
            }
        };

        self.services.guesses.append(guess).await?;

        let contribution = self.services.config.contribution_per_guess;
        let (pot, payout) = if guess == session.secret() {
            let split = self.settle_round(&session, contribution).await?;
            (split.rollover, Some(split))
        } else {
            (self.services.pot.add_contribution(contribution).await?, None)
        };

        let outcome = self.sessions.update(id, |s| s.record_guess(guess)).await?;
        if let (GuessOutcome::Correct { attempts }, Some(split)) = (&outcome, &payout) {
            tracing::info!(
                "Session {} won {} ETH after {} attempts",
                id,
                split.winner_share,
                attempts
            );
        }

        Ok(GuessReport {
            outcome,
            pot: Some(pot),
            payout,
        })
    }

    /// Fold the winning contribution into the pot and record the winner.
    /// The rollover is written only after the winner record is stored.
    async fn settle_round(&self, session: &GameSession, contribution: Wei) -> Result<PotSplit> {
        let winner = session.paid_by().unwrap_or(ANONYMOUS_WINNER).to_string();
        let winners = &self.services.winners;
        let split = self
            .services
            .pot
            .settle_with(contribution, self.services.config.winner_share_bps, |split| async move {
                winners.append(winner, split.winner_share).await
            })
            .await?;
        Ok(split)
    }

    /// Play again: new secret, empty history.
    pub async fn reset(&self, id: Uuid) -> Result<GameSession> {
        let _round = self.sessions.lock(id).await;
        self.sessions
            .update(id, |s| {
                s.reset();
                s.clone()
            })
            .await
    }

    /// Paywall page data. The on-chain pot is re-read at most once per refresh interval.
    pub async fn paywall_view(&self, id: Uuid) -> Result<PaywallView> {
        let _round = self.sessions.lock(id).await;
        let mut session = self.sessions.get(id)?;
        let refreshed = self
            .services
            .accumulator
            .refresh(
                session.pot_cache_mut(),
                self.services.config.pot_refresh_interval,
                Utc::now(),
            )
            .await;

        if refreshed {
            let cache = session.pot_cache().clone();
            self.sessions
                .update(id, |s| *s.pot_cache_mut() = cache)
                .await?;
        }

        let config = &self.services.config;
        let cache = session.pot_cache();

        Ok(PaywallView {
            session_id: id,
            unlocked: !config.paywall_enabled || session.is_unlocked(),
            wallet_address: config.wallet_address.clone(),
            min_amount: config.min_amount,
            payment_uri: payment_uri(&config.wallet_address, config.min_amount),
            pot: cache.total,
            pot_split: self.services.accumulator.split(cache.total),
            pot_warning: cache.warning.clone(),
            pot_fetched_at: cache.fetched_at,
            recent_winners: self.services.winners.recent(RECENT_WINNER_LIMIT).await,
            range: session.range(),
        })
    }

    pub async fn game_view(&self, id: Uuid) -> Result<GameView> {
        let session = self.sessions.get(id)?;
        let pot = self.services.pot.load().await;

        Ok(GameView {
            session_id: id,
            state: session.state(),
            attempts: session.attempts(),
            history: session.history().to_vec(),
            recent_guesses: self.services.guesses.recent(RECENT_GUESS_LIMIT).await,
            contribution_pot: pot,
            pot_split: PotSplit::of(pot, self.services.config.winner_share_bps),
            paid_by: session.paid_by().map(str::to_string),
            range: session.range(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GuessRejection, RoundState};
    use async_trait::async_trait;
    use guessloto_core::storage::WINNERS_FILE;
    use guessloto_core::{GameConfig, LedgerSource, TransferRecord, WinnerStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    const POT: &str = "0xPotWallet";
    const PLAYER: &str = "0xPlayer";

    struct StaticLedger {
        transfers: Vec<TransferRecord>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LedgerSource for StaticLedger {
        async fn fetch_transfers(&self, _address: &str) -> guessloto_core::Result<Vec<TransferRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.transfers.clone())
        }
    }

    fn eth(s: &str) -> Wei {
        Wei::from_eth_str(s).unwrap()
    }

    fn paid_ledger() -> Arc<StaticLedger> {
        Arc::new(StaticLedger {
            transfers: vec![TransferRecord {
                from: PLAYER.to_lowercase(),
                to: POT.to_lowercase(),
                value: eth("0.0001"),
                hash: "0xfeed".to_string(),
            }],
            calls: AtomicUsize::new(0),
        })
    }

    fn game(dir: &TempDir, ledger: Arc<StaticLedger>, paywall: bool) -> GuessLoto {
        let mut config = GameConfig::new(POT, "key");
        config.paywall_enabled = paywall;
        let services = LotoServices::with_ledger(config, dir.path(), ledger);
        GuessLoto::new(services, SessionStore::in_memory())
    }

    fn wrong_guess(session: &GameSession) -> String {
        let guess = if session.secret() == 1 { 2 } else { 1 };
        guess.to_string()
    }

    #[tokio::test]
    async fn test_locked_session_cannot_guess() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), true);
        let session = game.create_session().await.unwrap();

        assert!(!game.is_unlocked(session.id()).unwrap());
        assert!(matches!(
            game.submit_guess(session.id(), "5").await,
            Err(GameError::PaymentRequired(_))
        ));
        assert!(game.services().guesses.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_payment_unlocks_session() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), true);
        let id = game.create_session().await.unwrap().id();

        let check = game.verify_payment(id, "0xnobody").await.unwrap();
        assert_eq!(check, PaymentCheck::NotFound);
        assert!(!game.is_unlocked(id).unwrap());

        let check = game.verify_payment(id, PLAYER).await.unwrap();
        assert!(check.is_confirmed());
        assert!(game.is_unlocked(id).unwrap());
        assert_eq!(game.session(id).unwrap().paid_by(), Some(PLAYER));
    }

    #[tokio::test]
    async fn test_wrong_guess_is_logged_and_contributes() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false);
        let session = game.create_session().await.unwrap();
        let guess = wrong_guess(&session);

        let report = game.submit_guess(session.id(), &guess).await.unwrap();
        assert_eq!(report.outcome, GuessOutcome::Incorrect { attempts: 1 });
        assert_eq!(report.pot, Some(eth("0.0001")));
        assert!(report.payout.is_none());

        let view = game.game_view(session.id()).await.unwrap();
        assert_eq!(view.state, RoundState::AwaitingGuess);
        assert_eq!(view.attempts, 1);
        assert_eq!(view.recent_guesses.len(), 1);
        assert_eq!(view.contribution_pot, eth("0.0001"));
    }

    #[tokio::test]
    async fn test_rejected_guess_changes_nothing() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false);
        let id = game.create_session().await.unwrap().id();

        for input in ["0", "100000000001", "twelve", ""] {
            let report = game.submit_guess(id, input).await.unwrap();
            assert!(matches!(report.outcome, GuessOutcome::Rejected(_)));
            assert!(report.pot.is_none());
        }

        let session = game.session(id).unwrap();
        assert_eq!(session.attempts(), 0);
        assert!(game.services().guesses.all().await.is_empty());
        assert_eq!(game.services().pot.load().await, Wei::ZERO);
    }

    #[tokio::test]
    async fn test_winning_guess_settles_pot_and_records_winner() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), true);
        let id = game.create_session().await.unwrap().id();
        game.verify_payment(id, PLAYER).await.unwrap();

        let session = game.session(id).unwrap();
        game.submit_guess(id, &wrong_guess(&session)).await.unwrap();
        let report = game
            .submit_guess(id, &session.secret().to_string())
            .await
            .unwrap();

        assert_eq!(report.outcome, GuessOutcome::Correct { attempts: 2 });
        let payout = report.payout.unwrap();
        assert_eq!(payout.total, eth("0.0002"));
        assert_eq!(payout.winner_share, eth("0.000176"));
        assert_eq!(payout.rollover, eth("0.000024"));
        assert_eq!(report.pot, Some(eth("0.000024")));
        assert_eq!(game.services().pot.load().await, eth("0.000024"));

        let winners = game.services().winners.recent(3).await;
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].winner, PLAYER);
        assert_eq!(winners[0].amount, eth("0.000176"));

        let after = game.submit_guess(id, "5").await.unwrap();
        assert_eq!(after.outcome, GuessOutcome::Rejected(GuessRejection::RoundOver));
    }

    #[tokio::test]
    async fn test_anonymous_winner_without_paywall() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false).with_range(GuessRange { min: 1, max: 1 });
        let id = game.create_session().await.unwrap().id();

        let report = game.submit_guess(id, "1").await.unwrap();
        assert_eq!(report.outcome, GuessOutcome::Correct { attempts: 1 });
        assert_eq!(game.services().winners.all().await[0].winner, ANONYMOUS_WINNER);
    }

    #[tokio::test]
    async fn test_unreadable_winners_file_leaves_round_and_pot_unchanged() {
        let dir = tempdir().unwrap();
        let winners_path = dir.path().join(WINNERS_FILE);
        WinnerStore::new(&winners_path, Some("old".to_string()))
            .append("0xearlier", eth("1"))
            .await
            .unwrap();

        let mut config = GameConfig::new(POT, "key");
        config.paywall_enabled = false;
        config.secret_key = Some("new".to_string());
        let services = LotoServices::with_ledger(config, dir.path(), paid_ledger());
        let game = GuessLoto::new(services, SessionStore::in_memory()).with_range(GuessRange { min: 1, max: 1 });
        game.services().pot.add_contribution(eth("0.0001")).await.unwrap();
        let id = game.create_session().await.unwrap().id();

        assert!(game.submit_guess(id, "1").await.is_err());

        assert_eq!(game.services().pot.load().await, eth("0.0001"));
        let session = game.session(id).unwrap();
        assert!(!session.is_complete());
        assert_eq!(session.attempts(), 0);

        let history = WinnerStore::new(&winners_path, Some("old".to_string()));
        assert_eq!(history.all().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_winning_guesses_settle_once() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false).with_range(GuessRange { min: 1, max: 1 });
        let id = game.create_session().await.unwrap().id();

        let (first, second) = tokio::join!(game.submit_guess(id, "1"), game.submit_guess(id, "1"));
        let mut outcomes = vec![first.unwrap().outcome, second.unwrap().outcome];
        outcomes.sort_by_key(|o| matches!(o, GuessOutcome::Rejected(_)));

        assert_eq!(outcomes[0], GuessOutcome::Correct { attempts: 1 });
        assert_eq!(outcomes[1], GuessOutcome::Rejected(GuessRejection::RoundOver));
        assert_eq!(game.services().guesses.all().await, vec![1]);
        assert_eq!(game.services().winners.all().await.len(), 1);
        assert_eq!(game.services().pot.load().await, eth("0.000012"));
        assert_eq!(game.session(id).unwrap().attempts(), 1);
    }

    #[tokio::test]
    async fn test_reset_starts_new_round() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false);
        let session = game.create_session().await.unwrap();
        let id = session.id();
        game.submit_guess(id, &session.secret().to_string()).await.unwrap();
        assert!(game.session(id).unwrap().is_complete());

        let fresh = game.reset(id).await.unwrap();
        assert_eq!(fresh.state(), RoundState::AwaitingGuess);
        assert_eq!(fresh.attempts(), 0);
        assert!(fresh.history().is_empty());

        // shared guess log keeps the old round
        assert_eq!(game.services().guesses.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_paywall_view_throttles_ledger() {
        let dir = tempdir().unwrap();
        let ledger = paid_ledger();
        let game = game(&dir, ledger.clone(), true);
        let id = game.create_session().await.unwrap().id();

        let view = game.paywall_view(id).await.unwrap();
        assert_eq!(view.pot, eth("0.0001"));
        assert_eq!(view.pot_split.winner_share, eth("0.000088"));
        assert_eq!(view.payment_uri, format!("ethereum:{}?value=100000000000000", POT));
        assert!(!view.unlocked);
        assert!(view.pot_fetched_at.is_some());

        game.paywall_view(id).await.unwrap();
        game.paywall_view(id).await.unwrap();
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let dir = tempdir().unwrap();
        let game = game(&dir, paid_ledger(), false);
        let id = Uuid::new_v4();

        assert!(matches!(game.submit_guess(id, "1").await, Err(GameError::SessionNotFound(_))));
        assert!(matches!(game.paywall_view(id).await, Err(GameError::SessionNotFound(_))));
        assert!(matches!(
            game.verify_payment(id, PLAYER).await,
            Err(GameError::SessionNotFound(_))
        ));
    }
}
