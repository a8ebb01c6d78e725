//! In-memory store implementations.
//!
//! Each collection is a `parking_lot::RwLock` over a sorted map (or vec for
//! the append-only ledger). Holding the write lock for the whole of an
//! operation is what makes inserts and the conditional decrement atomic.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use boxoffice_types::{BackendSnafu, Booking, Concert, DuplicateKeySnafu, Result, UserRecord};
use parking_lot::RwLock;

use crate::{BookingLedger, CatalogStore, CredentialStore, DecrementOutcome};

/// In-memory user collection keyed by username.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    rows: RwLock<BTreeMap<String, UserRecord>>,
}

impl MemoryCredentials {
    /// Creates an empty credential store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentials {
    fn insert(&self, user: UserRecord) -> Result<()> {
        let mut rows = self.rows.write();
        match rows.entry(user.username.clone()) {
            Entry::Occupied(_) => DuplicateKeySnafu { key: user.username }.fail(),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    fn find(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.rows.read().get(username).cloned())
    }
}

/// In-memory concert collection keyed by concert name.
///
/// Iteration order (and therefore [`CatalogStore::scan`] order) is name
/// order, which is stable within a snapshot.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    rows: RwLock<BTreeMap<String, Concert>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalog {
    fn insert(&self, concert: Concert) -> Result<()> {
        let mut rows = self.rows.write();
        match rows.entry(concert.name.clone()) {
            Entry::Occupied(_) => DuplicateKeySnafu { key: concert.name }.fail(),
            Entry::Vacant(slot) => {
                slot.insert(concert);
                Ok(())
            }
        }
    }

    fn get(&self, name: &str) -> Result<Option<Concert>> {
        Ok(self.rows.read().get(name).cloned())
    }

    fn update_details(&self, name: &str, location: &str, date: &str) -> Result<bool> {
        let mut rows = self.rows.write();
        match rows.get_mut(name) {
            Some(concert) => {
                concert.location = location.to_owned();
                concert.date = date.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.rows.write().remove(name).is_some())
    }

    fn scan(&self) -> Result<Vec<Concert>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn decrement_tickets(&self, name: &str, quantity: u32) -> Result<DecrementOutcome> {
        // Guard and decrement under one write lock: this is the atomic
        // conditional decrement the booking engine relies on.
        let mut rows = self.rows.write();
        let Some(concert) = rows.get_mut(name) else {
            return Ok(DecrementOutcome::NotFound);
        };
        if concert.ticket_count < quantity {
            return Ok(DecrementOutcome::Insufficient { available: concert.ticket_count });
        }
        concert.ticket_count -= quantity;
        Ok(DecrementOutcome::Applied { remaining: concert.ticket_count })
    }
}

/// In-memory append-only booking ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    rows: RwLock<Vec<Booking>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded bookings.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if no bookings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl BookingLedger for MemoryLedger {
    fn append(&self, booking: Booking) -> Result<()> {
        if booking.quantity == 0 {
            return BackendSnafu { message: "booking quantity must be positive" }.fail();
        }
        self.rows.write().push(booking);
        Ok(())
    }

    fn exists_for(&self, concert_name: &str) -> Result<bool> {
        Ok(self.rows.read().iter().any(|b| b.concert_name == concert_name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn concert(name: &str, tickets: u32) -> Concert {
        Concert {
            name: name.to_owned(),
            location: "Jakarta".to_owned(),
            date: "2026-06-01".to_owned(),
            ticket_count: tickets,
        }
    }

    #[test]
    fn credentials_duplicate_insert_fails_and_keeps_original() {
        let store = MemoryCredentials::new();
        store
            .insert(UserRecord {
                username: "alice".into(),
                password_hash: "hash-one".into(),
            })
            .unwrap();

        let err = store
            .insert(UserRecord {
                username: "alice".into(),
                password_hash: "hash-two".into(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("alice"));

        // The first hash must survive the rejected second insert.
        let stored = store.find("alice").unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-one");
    }

    #[test]
    fn catalog_duplicate_insert_fails() {
        let store = MemoryCatalog::new();
        store.insert(concert("Aurora Live", 10)).unwrap();
        assert!(store.insert(concert("Aurora Live", 99)).is_err());
        assert_eq!(store.get("Aurora Live").unwrap().unwrap().ticket_count, 10);
    }

    #[test]
    fn update_details_leaves_ticket_count_alone() {
        let store = MemoryCatalog::new();
        store.insert(concert("Aurora Live", 10)).unwrap();

        assert!(store.update_details("Aurora Live", "Bandung", "2026-07-01").unwrap());
        let row = store.get("Aurora Live").unwrap().unwrap();
        assert_eq!(row.location, "Bandung");
        assert_eq!(row.date, "2026-07-01");
        assert_eq!(row.ticket_count, 10);

        assert!(!store.update_details("missing", "x", "2026-07-01").unwrap());
    }

    #[test]
    fn scan_is_name_ordered_snapshot() {
        let store = MemoryCatalog::new();
        store.insert(concert("b-fest", 1)).unwrap();
        store.insert(concert("a-fest", 1)).unwrap();
        store.insert(concert("c-fest", 1)).unwrap();

        let names: Vec<_> = store.scan().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["a-fest", "b-fest", "c-fest"]);
    }

    #[test]
    fn decrement_outcomes() {
        let store = MemoryCatalog::new();
        store.insert(concert("Aurora Live", 5)).unwrap();

        assert_eq!(
            store.decrement_tickets("Aurora Live", 3).unwrap(),
            DecrementOutcome::Applied { remaining: 2 }
        );
        assert_eq!(
            store.decrement_tickets("Aurora Live", 3).unwrap(),
            DecrementOutcome::Insufficient { available: 2 }
        );
        assert_eq!(
            store.decrement_tickets("Aurora Live", 2).unwrap(),
            DecrementOutcome::Applied { remaining: 0 }
        );
        assert_eq!(
            store.decrement_tickets("missing", 1).unwrap(),
            DecrementOutcome::NotFound
        );
    }

    #[test]
    fn insufficient_decrement_changes_nothing() {
        let store = MemoryCatalog::new();
        store.insert(concert("Aurora Live", 2)).unwrap();

        store.decrement_tickets("Aurora Live", 5).unwrap();
        assert_eq!(store.get("Aurora Live").unwrap().unwrap().ticket_count, 2);
    }

    /// Hammers one row from many threads. With the conditional decrement the
    /// count never goes below zero and exactly `initial` single-ticket
    /// decrements succeed.
    #[test]
    fn concurrent_decrements_never_oversell() {
        let store = Arc::new(MemoryCatalog::new());
        let initial = 64u32;
        store.insert(concert("Aurora Live", initial)).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let mut applied = 0u32;
                for _ in 0..16 {
                    if let DecrementOutcome::Applied { .. } =
                        store.decrement_tickets("Aurora Live", 1).unwrap()
                    {
                        applied += 1;
                    }
                }
                applied
            }));
        }

        let total_applied: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 8 threads x 16 attempts = 128 attempts against 64 tickets.
        assert_eq!(total_applied, initial);
        assert_eq!(store.get("Aurora Live").unwrap().unwrap().ticket_count, 0);
    }

    #[test]
    fn ledger_guard_and_append() {
        let ledger = MemoryLedger::new();
        assert!(!ledger.exists_for("Aurora Live").unwrap());

        ledger.append(Booking::priced("Aurora Live", 2)).unwrap();
        assert!(ledger.exists_for("Aurora Live").unwrap());
        assert!(!ledger.exists_for("Other").unwrap());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn ledger_rejects_zero_quantity() {
        let ledger = MemoryLedger::new();
        assert!(ledger.append(Booking::priced("Aurora Live", 0)).is_err());
        assert!(ledger.is_empty());
    }
}
