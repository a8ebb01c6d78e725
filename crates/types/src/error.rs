//! Store error taxonomy.
//!
//! Store operations fail for a small, closed set of reasons. Business-level
//! outcomes (insufficient inventory, delete guard, auth failure) are not
//! errors at this layer; they are typed results of the individual store
//! operations.

use snafu::Snafu;

/// Result type alias for store operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors surfaced by the store layer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// An insert hit an existing row with the same unique key.
    ///
    /// The duplicate check happens inside the insert itself, so two racing
    /// inserts of the same key cannot both succeed.
    #[snafu(display("duplicate key: {key}"))]
    DuplicateKey {
        /// The offending unique key.
        key: String,
    },

    /// The underlying storage backend failed.
    ///
    /// The in-memory stores never produce this; it exists for persistent
    /// implementations behind the same traits.
    #[snafu(display("storage backend error: {message}"))]
    Backend {
        /// Backend-specific failure description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_key() {
        let err = DuplicateKeySnafu { key: "alice" }.build();
        assert_eq!(err.to_string(), "duplicate key: alice");
    }
}
