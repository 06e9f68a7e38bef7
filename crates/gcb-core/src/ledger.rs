//! Subscription ledger: the in-memory map of user → access expiration.
//!
//! Process-lifetime only; nothing is persisted. A new purchase overwrites
//! the prior expiration unconditionally (last write wins, no stacking).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};

use crate::domain::UserId;

/// Cheap-to-clone handle; all clones share the same map.
///
/// Every operation is a single non-suspending critical section, so handlers
/// and the sweeper can share this across tasks without further coordination.
#[derive(Clone, Default)]
pub struct SubscriptionLedger {
    inner: Arc<Mutex<HashMap<UserId, DateTime<Utc>>>>,
}

impl SubscriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `now + duration` as the user's expiration, replacing any prior
    /// entry. Returns the computed expiration.
    pub fn record(&self, user: UserId, duration: Duration) -> DateTime<Utc> {
        self.record_at(user, duration, Utc::now())
    }

    pub fn record_at(&self, user: UserId, duration: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
        let expires_at = now + duration;
        self.lock().insert(user, expires_at);
        expires_at
    }

    /// Snapshot of all entries. Safe to mutate the ledger while iterating
    /// the returned vector.
    pub fn entries(&self) -> Vec<(UserId, DateTime<Utc>)> {
        self.lock().iter().map(|(u, t)| (*u, *t)).collect()
    }

    /// Delete the entry if present. Returns whether one existed.
    pub fn remove(&self, user: UserId) -> bool {
        self.lock().remove(&user).is_some()
    }

    pub fn expires_at(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.lock().get(&user).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, DateTime<Utc>>> {
        // Lock poisoning only happens if a panic occurred mid-mutation; the
        // map holds plain Copy values, so the data is still coherent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn record_computes_expiration_from_now() {
        let ledger = SubscriptionLedger::new();
        let expires = ledger.record_at(UserId(42), Duration::days(30), t0());
        assert_eq!(expires, t0() + Duration::days(30));
        assert_eq!(ledger.entries(), vec![(UserId(42), expires)]);
    }

    #[test]
    fn record_overwrites_prior_entry() {
        let ledger = SubscriptionLedger::new();
        ledger.record_at(UserId(42), Duration::days(30), t0());
        ledger.record_at(UserId(42), Duration::days(90), t0());

        // Only the latest expiration is retained; durations never stack.
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.expires_at(UserId(42)),
            Some(t0() + Duration::days(90))
        );
    }

    #[test]
    fn remove_is_noop_for_missing_user() {
        let ledger = SubscriptionLedger::new();
        assert!(!ledger.remove(UserId(7)));
        ledger.record_at(UserId(7), Duration::days(1), t0());
        assert!(ledger.remove(UserId(7)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn snapshot_survives_mutation() {
        let ledger = SubscriptionLedger::new();
        ledger.record_at(UserId(1), Duration::days(1), t0());
        ledger.record_at(UserId(2), Duration::days(2), t0());

        let snapshot = ledger.entries();
        for (user, _) in &snapshot {
            ledger.remove(*user);
        }
        assert_eq!(snapshot.len(), 2);
        assert!(ledger.is_empty());
    }
}
