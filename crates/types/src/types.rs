//! Persisted record types.

use serde::{Deserialize, Serialize};

/// Price of a single ticket, in minor currency units.
///
/// Applied at booking time: `total_price = quantity * TICKET_UNIT_PRICE`.
pub const TICKET_UNIT_PRICE: i64 = 150_000;

/// A registered user.
///
/// `password_hash` is a PHC-format argon2id hash with an embedded salt.
/// The plaintext password never appears in a `UserRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique username.
    pub username: String,
    /// Salted one-way hash of the password (PHC string).
    pub password_hash: String,
}

/// A concert listing.
///
/// `ticket_count` is the remaining inventory. It only ever decreases, and
/// only through the catalog store's atomic conditional decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concert {
    /// Unique concert name.
    pub name: String,
    /// Venue location.
    pub location: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date: String,
    /// Remaining tickets. Never observed below zero.
    pub ticket_count: u32,
}

/// A completed ticket purchase.
///
/// Bookings are immutable and never deleted: the existence of a booking for
/// a concert name is what blocks deletion of that concert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Name of the concert the tickets were bought for.
    pub concert_name: String,
    /// Number of tickets purchased. Always positive.
    pub quantity: u32,
    /// Total paid: `quantity * TICKET_UNIT_PRICE`.
    pub total_price: i64,
}

impl Booking {
    /// Builds a booking for `quantity` tickets, pricing it at the fixed
    /// unit price.
    pub fn priced(concert_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            concert_name: concert_name.into(),
            quantity,
            total_price: i64::from(quantity) * TICKET_UNIT_PRICE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priced_booking_uses_unit_price() {
        let booking = Booking::priced("Aurora Live", 3);
        assert_eq!(booking.concert_name, "Aurora Live");
        assert_eq!(booking.quantity, 3);
        assert_eq!(booking.total_price, 450_000);
    }
}
