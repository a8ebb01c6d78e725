//! BoxOffice gRPC server library.
//!
//! Exposes the service implementations, server assembly, and configuration
//! so integration tests (and embedders) can run the full stack in-process.

#![deny(unsafe_code)]
// gRPC services return tonic::Status - standard practice for gRPC error handling
#![allow(clippy::result_large_err)]

pub mod config;
pub mod server;
pub mod services;
pub mod shutdown;
