//! Store interfaces for the BoxOffice ticketing service.
//!
//! The three collections (users, concerts, bookings) are process-wide shared
//! resources owned by the store layer. Services receive store handles at
//! construction time and never touch ambient globals; the handles live from
//! service start to shutdown.
//!
//! The one concurrency-sensitive operation lives here:
//! [`CatalogStore::decrement_tickets`] is a single indivisible
//! compare-and-decrement. Ticket counts are never mutated any other way, so
//! a read-then-write lost update cannot occur no matter how many sessions
//! book concurrently.

#![deny(unsafe_code)]

mod memory;

use boxoffice_types::{Booking, Concert, Result, UserRecord};

pub use memory::{MemoryCatalog, MemoryCredentials, MemoryLedger};

/// Outcome of an atomic conditional decrement against a concert row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The guard held and the decrement was applied.
    Applied {
        /// Tickets remaining after the decrement.
        remaining: u32,
    },
    /// The row exists but holds fewer tickets than requested. Nothing was
    /// changed.
    Insufficient {
        /// Tickets available at the moment of evaluation.
        available: u32,
    },
    /// No concert row with that name exists.
    NotFound,
}

/// Persisted user records: lookup by name and atomic unique insert.
pub trait CredentialStore: Send + Sync {
    /// Inserts a new user. Fails with [`StoreError::DuplicateKey`] if the
    /// username is already taken; the check and the insert are one atomic
    /// operation.
    ///
    /// [`StoreError::DuplicateKey`]: boxoffice_types::StoreError::DuplicateKey
    fn insert(&self, user: UserRecord) -> Result<()>;

    /// Looks up a user by name.
    fn find(&self, username: &str) -> Result<Option<UserRecord>>;
}

/// Persisted concert records: CRUD plus the atomic conditional decrement.
pub trait CatalogStore: Send + Sync {
    /// Inserts a new concert. Fails with [`StoreError::DuplicateKey`] if a
    /// concert with the same name exists.
    ///
    /// [`StoreError::DuplicateKey`]: boxoffice_types::StoreError::DuplicateKey
    fn insert(&self, concert: Concert) -> Result<()>;

    /// Fetches a concert by name.
    fn get(&self, name: &str) -> Result<Option<Concert>>;

    /// Updates location and date of an existing concert. Returns `false` if
    /// no row matched. Ticket counts are deliberately not updatable here.
    fn update_details(&self, name: &str, location: &str, date: &str) -> Result<bool>;

    /// Deletes a concert by name. Returns `false` if no row matched.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Returns a one-shot snapshot of all concerts. Ordering is stable
    /// within a single snapshot.
    fn scan(&self) -> Result<Vec<Concert>>;

    /// Atomically decrements a concert's ticket count by `quantity`,
    /// conditioned on at least `quantity` tickets remaining.
    ///
    /// Guard evaluation and decrement happen as one indivisible operation;
    /// concurrent callers serialize on the row, so the count can never go
    /// negative and the sum of applied decrements never exceeds the initial
    /// inventory.
    fn decrement_tickets(&self, name: &str, quantity: u32) -> Result<DecrementOutcome>;
}

/// Persisted booking records: append and existence check.
pub trait BookingLedger: Send + Sync {
    /// Appends a booking. Bookings are immutable once written.
    fn append(&self, booking: Booking) -> Result<()>;

    /// Returns `true` if any booking references the given concert name.
    /// This is the delete guard for the catalog.
    fn exists_for(&self, concert_name: &str) -> Result<bool>;
}
