//! Expiry sweeper: the recurring pass that evicts lapsed subscribers.
//!
//! Each sweep walks a ledger snapshot, kicks every expired user from the
//! gated channel (ban then clear the ban, so rejoining stays possible) and
//! deletes the ledger entry on success. A failed eviction is logged and the
//! entry is left in place, so the next cycle retries it (at-least-once,
//! unbounded retry).

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    domain::{ChatId, UserId},
    ledger::SubscriptionLedger,
    ports::ChannelGate,
    Result,
};

/// Outcome of one full sweep over the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub evicted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ExpirySweeper {
    ledger: SubscriptionLedger,
    gate: Arc<dyn ChannelGate>,
    channel: ChatId,
}

impl ExpirySweeper {
    pub fn new(ledger: SubscriptionLedger, gate: Arc<dyn ChannelGate>, channel: ChatId) -> Self {
        Self {
            ledger,
            gate,
            channel,
        }
    }

    /// One full pass over the ledger at the current wall clock.
    pub async fn sweep(&self) -> SweepStats {
        self.sweep_at(Utc::now()).await
    }

    /// One full pass at an injected `now`; tests drive time through this.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepStats {
        let snapshot = self.ledger.entries();
        let mut stats = SweepStats {
            scanned: snapshot.len(),
            ..SweepStats::default()
        };

        for (user, expires_at) in snapshot {
            if now < expires_at {
                continue;
            }

            match self.evict(user).await {
                Ok(()) => {
                    self.ledger.remove(user);
                    stats.evicted += 1;
                    info!(user = user.0, "removed expired subscriber from channel");
                }
                Err(e) => {
                    // Entry stays in the ledger; the next sweep retries it.
                    stats.failed += 1;
                    error!(user = user.0, "failed to remove expired subscriber: {e}");
                }
            }
        }

        stats
    }

    async fn evict(&self, user: UserId) -> Result<()> {
        self.gate.remove_member(self.channel, user).await?;
        self.gate.clear_removal(self.channel, user).await?;
        Ok(())
    }

    /// Run sweeps on a fixed period until the token is cancelled.
    ///
    /// Note: `tokio::time::interval` fires its first tick immediately, so a
    /// fresh process sweeps once at startup before settling into the period.
    pub fn spawn(self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tokio::select! {
                  _ = cancel.cancelled() => break,
                  _ = tick.tick() => {
                    let stats = self.sweep().await;
                    if stats.scanned > 0 {
                        info!(
                            scanned = stats.scanned,
                            evicted = stats.evicted,
                            failed = stats.failed,
                            "sweep complete"
                        );
                    }
                  }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        Remove(i64),
        Clear(i64),
    }

    #[derive(Default)]
    struct FakeGate {
        calls: Mutex<Vec<Call>>,
        fail: AtomicBool,
    }

    impl FakeGate {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ChannelGate for FakeGate {
        async fn remove_member(&self, _channel: ChatId, user: UserId) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(crate::Error::External("telegram unreachable".into()));
            }
            self.calls.lock().unwrap().push(Call::Remove(user.0));
            Ok(())
        }

        async fn clear_removal(&self, _channel: ChatId, user: UserId) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Clear(user.0));
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn sweeper_with(gate: Arc<FakeGate>) -> (SubscriptionLedger, ExpirySweeper) {
        let ledger = SubscriptionLedger::new();
        let sweeper = ExpirySweeper::new(ledger.clone(), gate, ChatId(-100));
        (ledger, sweeper)
    }

    #[tokio::test]
    async fn unexpired_entries_are_never_touched() {
        let gate = Arc::new(FakeGate::default());
        let (ledger, sweeper) = sweeper_with(gate.clone());
        ledger.record_at(UserId(42), ChronoDuration::days(30), t0());

        let stats = sweeper.sweep_at(t0() + ChronoDuration::days(29)).await;

        assert_eq!(stats, SweepStats { scanned: 1, evicted: 0, failed: 0 });
        assert!(gate.calls().is_empty());
        assert!(ledger.expires_at(UserId(42)).is_some());
    }

    #[tokio::test]
    async fn expired_entry_is_kicked_once_and_removed() {
        let gate = Arc::new(FakeGate::default());
        let (ledger, sweeper) = sweeper_with(gate.clone());
        ledger.record_at(UserId(42), ChronoDuration::days(30), t0());

        let stats = sweeper.sweep_at(t0() + ChronoDuration::days(31)).await;

        assert_eq!(stats.evicted, 1);
        assert_eq!(gate.calls(), vec![Call::Remove(42), Call::Clear(42)]);
        assert!(ledger.expires_at(UserId(42)).is_none());

        // A second sweep finds nothing left to do.
        let again = sweeper.sweep_at(t0() + ChronoDuration::days(32)).await;
        assert_eq!(again, SweepStats::default());
        assert_eq!(gate.calls().len(), 2);
    }

    #[tokio::test]
    async fn eviction_at_exact_expiry_instant() {
        let gate = Arc::new(FakeGate::default());
        let (ledger, sweeper) = sweeper_with(gate.clone());
        let expires = ledger.record_at(UserId(9), ChronoDuration::days(7), t0());

        // now >= expiration evicts; strictly-before does not.
        let stats = sweeper.sweep_at(expires).await;
        assert_eq!(stats.evicted, 1);
    }

    #[tokio::test]
    async fn failed_eviction_keeps_entry_for_next_cycle() {
        let gate = Arc::new(FakeGate::default());
        let (ledger, sweeper) = sweeper_with(gate.clone());
        ledger.record_at(UserId(42), ChronoDuration::days(30), t0());

        gate.set_failing(true);
        let stats = sweeper.sweep_at(t0() + ChronoDuration::days(31)).await;
        assert_eq!(stats, SweepStats { scanned: 1, evicted: 0, failed: 1 });
        assert!(ledger.expires_at(UserId(42)).is_some());

        // Next cycle succeeds and clears the entry.
        gate.set_failing(false);
        let retry = sweeper.sweep_at(t0() + ChronoDuration::days(32)).await;
        assert_eq!(retry.evicted, 1);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn mixed_ledger_only_evicts_the_expired() {
        let gate = Arc::new(FakeGate::default());
        let (ledger, sweeper) = sweeper_with(gate.clone());
        ledger.record_at(UserId(1), ChronoDuration::days(1), t0());
        ledger.record_at(UserId(2), ChronoDuration::days(90), t0());

        let stats = sweeper.sweep_at(t0() + ChronoDuration::days(10)).await;
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.evicted, 1);
        assert_eq!(ledger.entries(), vec![(UserId(2), t0() + ChronoDuration::days(90))]);
    }

    #[tokio::test]
    async fn spawn_loop_stops_on_cancellation() {
        let gate = Arc::new(FakeGate::default());
        let (_ledger, sweeper) = sweeper_with(gate);

        let cancel = CancellationToken::new();
        let handle = sweeper.spawn(Duration::from_secs(3600), cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
