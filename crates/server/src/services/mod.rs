//! gRPC service implementations.
//!
//! One module per proto service. Business outcomes travel as response
//! messages the client displays verbatim; `tonic::Status` is reserved for
//! malformed requests and internal faults.

mod auth;
mod booking;
mod catalog;
mod chat;

pub use auth::AuthServiceImpl;
pub use booking::BookingServiceImpl;
pub use catalog::CatalogServiceImpl;
pub use chat::ChatServiceImpl;

use boxoffice_types::StoreError;
use tonic::Status;

/// Converts a store-layer fault into an opaque internal `Status`.
///
/// The fault detail goes to the log, not to the client.
pub(crate) fn store_fault(err: &StoreError) -> Status {
    tracing::error!(error = %err, "Store fault");
    Status::internal("internal store fault")
}
