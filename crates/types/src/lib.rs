//! Domain types for the BoxOffice ticketing service.
//!
//! This crate holds the types shared by the store layer and the gRPC
//! services:
//! - Persisted records ([`UserRecord`], [`Concert`], [`Booking`])
//! - The store error taxonomy ([`StoreError`])
//! - Input validation helpers ([`validation`])
//!
//! It deliberately has no dependency on the wire format or the store
//! implementation so that both can evolve independently.

#![deny(unsafe_code)]

mod error;
mod types;

pub mod validation;

pub use error::{BackendSnafu, DuplicateKeySnafu, Result, StoreError};
pub use types::{Booking, Concert, UserRecord, TICKET_UNIT_PRICE};
