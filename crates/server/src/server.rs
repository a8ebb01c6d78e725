//! gRPC server assembly.
//!
//! [`BoxOfficeServer`] wires the four services to their shared store handles
//! and serves them on one tonic endpoint, so a single client connection
//! multiplexes every call shape.

use std::net::SocketAddr;
use std::sync::Arc;

use boxoffice_proto::proto::{
    auth_service_server::AuthServiceServer, booking_service_server::BookingServiceServer,
    catalog_service_server::CatalogServiceServer, chat_service_server::ChatServiceServer,
};
use boxoffice_store::{BookingLedger, CatalogStore, CredentialStore};
use tonic::transport::Server;
use tower::ServiceBuilder;

use crate::services::{AuthServiceImpl, BookingServiceImpl, CatalogServiceImpl, ChatServiceImpl};

/// The BoxOffice gRPC server.
///
/// Store handles are injected at build time; services never touch ambient
/// globals. Supports graceful shutdown via a `shutdown_rx` watch channel.
#[derive(bon::Builder)]
#[builder(on(_, required))]
pub struct BoxOfficeServer {
    /// User record store.
    credentials: Arc<dyn CredentialStore>,
    /// Concert record store.
    catalog: Arc<dyn CatalogStore>,
    /// Booking ledger.
    ledger: Arc<dyn BookingLedger>,
    /// Server address.
    addr: SocketAddr,
    /// Max concurrent requests per connection.
    #[builder(default = 100)]
    max_concurrent: usize,
    /// Shutdown signal receiver. When `true` is sent, the server stops.
    #[builder(default)]
    shutdown_rx: Option<tokio::sync::watch::Receiver<bool>>,
}

impl BoxOfficeServer {
    /// Starts the gRPC server.
    ///
    /// Blocks until the server is shut down. If a `shutdown_rx` was provided
    /// via the builder, the server stops when the signal is received;
    /// otherwise it blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured
    /// address or encounters a transport-level error during operation.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!(
            max_concurrent = self.max_concurrent,
            "Configuring request limits"
        );

        // Concurrency limit plus load shedding for backpressure. No request
        // timeout layer: chat and batch sessions are open-ended and live
        // until the client closes or the transport fails.
        let layer = ServiceBuilder::new()
            .concurrency_limit(self.max_concurrent)
            .load_shed()
            .into_inner();

        let auth_service = AuthServiceImpl::builder()
            .credentials(self.credentials.clone())
            .build();
        let catalog_service = CatalogServiceImpl::builder()
            .catalog(self.catalog.clone())
            .ledger(self.ledger.clone())
            .build();
        let booking_service = BookingServiceImpl::builder()
            .catalog(self.catalog.clone())
            .ledger(self.ledger.clone())
            .build();
        let chat_service = ChatServiceImpl;

        tracing::info!("Starting BoxOffice gRPC server on {}", self.addr);

        let router = Server::builder()
            .layer(layer)
            .add_service(AuthServiceServer::new(auth_service))
            .add_service(CatalogServiceServer::new(catalog_service))
            .add_service(BookingServiceServer::new(booking_service))
            .add_service(ChatServiceServer::new(chat_service));

        if let Some(mut shutdown_rx) = self.shutdown_rx {
            router
                .serve_with_shutdown(self.addr, async move {
                    let _ = shutdown_rx.wait_for(|v| *v).await;
                    tracing::info!("Shutdown signal received, stopping gRPC server");
                })
                .await?;
        } else {
            router.serve(self.addr).await?;
        }

        Ok(())
    }
}
