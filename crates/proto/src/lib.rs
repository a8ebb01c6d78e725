//! Protobuf types and gRPC service definitions for BoxOffice.
//!
//! This crate provides:
//! - Generated protobuf types and gRPC service traits ([`proto`])
//! - Conversions between domain types and proto types ([`convert`])
//!
//! Kept separate from the server so that clients and tooling can depend on
//! the wire format without pulling in the service implementations.

#![deny(unsafe_code)]
// gRPC services return tonic::Status - standard practice for gRPC error handling
#![allow(clippy::result_large_err)]

/// Generated protobuf types and service traits.
pub mod proto {
    #![allow(clippy::all)]
    #![allow(missing_docs)]

    // Use pre-generated code when protoc isn't available
    #[cfg(use_pregenerated_proto)]
    include!("generated/boxoffice.v1.rs");

    // Use build-time generated code otherwise
    #[cfg(not(use_pregenerated_proto))]
    tonic::include_proto!("boxoffice.v1");
}

/// Conversions between domain and protobuf types.
pub mod convert;
