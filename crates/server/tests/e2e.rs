//! End-to-end tests over a real loopback connection.
//!
//! Each test boots a fresh server with its own stores and drives it with the
//! generated clients, covering all four call shapes on one channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use boxoffice_proto::proto::{
    BatchStatus, BookTicketRequest, ChatMessage, CreateConcertRequest, DeleteConcertRequest,
    ListConcertsRequest, LoginUserRequest, RegisterUserRequest, UpdateConcertRequest,
    auth_service_client::AuthServiceClient, booking_service_client::BookingServiceClient,
    catalog_service_client::CatalogServiceClient, chat_service_client::ChatServiceClient,
};
use boxoffice_server::server::BoxOfficeServer;
use boxoffice_store::{MemoryCatalog, MemoryCredentials, MemoryLedger};
use boxoffice_types::TICKET_UNIT_PRICE;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;

/// A running server plus the handle that stops it.
struct TestServer {
    channel: Channel,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl TestServer {
    /// Boots a server on a random loopback port and connects a channel.
    async fn start() -> Self {
        // Wide random range to minimize port conflicts when tests run in parallel
        let port = 40000 + (rand::random::<u16>() % 20000);
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let server = BoxOfficeServer::builder()
            .credentials(Arc::new(MemoryCredentials::new()))
            .catalog(Arc::new(MemoryCatalog::new()))
            .ledger(Arc::new(MemoryLedger::new()))
            .addr(addr)
            .max_concurrent(16)
            .shutdown_rx(Some(shutdown_rx))
            .build();

        tokio::spawn(async move {
            if let Err(e) = server.serve().await.map_err(|e| e.to_string()) {
                eprintln!("test server exited with error: {}", e);
            }
        });

        let endpoint = format!("http://{}", addr);
        let mut last_error = String::new();
        for _ in 0..50 {
            match Channel::from_shared(endpoint.clone()).unwrap().connect().await {
                Ok(channel) => {
                    return Self {
                        channel,
                        shutdown_tx,
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            }
        }
        panic!("server never came up on {}: {}", endpoint, last_error);
    }

    fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

fn create_req(name: &str, tickets: u32) -> CreateConcertRequest {
    CreateConcertRequest {
        name: name.to_string(),
        location: "Arena".to_string(),
        date: "2026-09-01".to_string(),
        ticket_count: tickets,
    }
}

fn book_req(name: &str, quantity: u32) -> BookTicketRequest {
    BookTicketRequest {
        concert_name: name.to_string(),
        quantity,
    }
}

#[tokio::test]
async fn auth_register_and_login_over_the_wire() {
    let server = TestServer::start().await;
    let mut auth = AuthServiceClient::new(server.channel.clone());

    let reg = auth
        .register_user(RegisterUserRequest {
            username: "ayu".to_string(),
            password: "s3cret".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(reg.success);

    let dup = auth
        .register_user(RegisterUserRequest {
            username: "ayu".to_string(),
            password: "other".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(!dup.success);

    let ok = auth
        .login_user(LoginUserRequest {
            username: "ayu".to_string(),
            password: "s3cret".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(ok.success);

    let bad = auth
        .login_user(LoginUserRequest {
            username: "ayu".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(!bad.success);

    server.stop();
}

#[tokio::test]
async fn catalog_crud_with_streamed_listing_and_delete_guard() {
    let server = TestServer::start().await;
    let mut catalog = CatalogServiceClient::new(server.channel.clone());
    let mut booking = BookingServiceClient::new(server.channel.clone());

    catalog.create_concert(create_req("Zenith", 10)).await.unwrap();
    catalog.create_concert(create_req("Aurora", 20)).await.unwrap();

    let mut listing = catalog
        .list_concerts(ListConcertsRequest {})
        .await
        .unwrap()
        .into_inner();
    let mut names = Vec::new();
    while let Some(concert) = listing.next().await {
        names.push(concert.unwrap().name);
    }
    assert_eq!(names, vec!["Aurora".to_string(), "Zenith".to_string()]);

    let updated = catalog
        .update_concert(UpdateConcertRequest {
            name: "Aurora".to_string(),
            location: "Stadium".to_string(),
            date: "2026-10-10".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(updated.message.contains("updated"));

    // Book Aurora, then try to delete it: the ledger guard must hold.
    booking.book_ticket(book_req("Aurora", 1)).await.unwrap();
    let guarded = catalog
        .delete_concert(DeleteConcertRequest {
            name: "Aurora".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(guarded.message.contains("cannot be deleted"));

    // Zenith has no bookings and deletes cleanly.
    let deleted = catalog
        .delete_concert(DeleteConcertRequest {
            name: "Zenith".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(deleted.message.contains("deleted"));

    server.stop();
}

#[tokio::test]
async fn booking_single_and_client_streamed_batch() {
    let server = TestServer::start().await;
    let mut catalog = CatalogServiceClient::new(server.channel.clone());
    let mut booking = BookingServiceClient::new(server.channel.clone());

    catalog.create_concert(create_req("Gala", 10)).await.unwrap();

    let single = booking.book_ticket(book_req("Gala", 3)).await.unwrap().into_inner();
    assert_eq!(single.total_price, 3 * TICKET_UNIT_PRICE);

    let refused = booking.book_ticket(book_req("Gala", 100)).await.unwrap().into_inner();
    assert_eq!(refused.total_price, 0);

    // 2 good items + 1 unknown concert: succeeded=2, failed=1.
    let batch = booking
        .book_tickets(tokio_stream::iter(vec![
            book_req("Gala", 2),
            book_req("Ghost", 1),
            book_req("Gala", 1),
        ]))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(batch.status, BatchStatus::Completed as i32);
    assert_eq!(batch.succeeded, 2);
    assert_eq!(batch.failed, 1);

    let empty = booking
        .book_tickets(tokio_stream::iter(Vec::<BookTicketRequest>::new()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(empty.status, BatchStatus::NothingProcessed as i32);

    server.stop();
}

#[tokio::test]
async fn live_chat_echoes_each_message_in_order() {
    let server = TestServer::start().await;
    let mut chat = ChatServiceClient::new(server.channel.clone());

    let (tx, rx) = tokio::sync::mpsc::channel(4);
    let mut replies = chat
        .live_chat(ReceiverStream::new(rx))
        .await
        .unwrap()
        .into_inner();

    for text in ["one", "two", "three"] {
        tx.send(ChatMessage {
            user: "ayu".to_string(),
            text: text.to_string(),
        })
        .await
        .unwrap();

        let reply = replies.next().await.unwrap().unwrap();
        assert_eq!(reply.user, "Server");
        assert_eq!(reply.text, format!("Hello ayu, you said: {}", text));
    }

    // Half-close ends the session; the outbound stream drains to None.
    drop(tx);
    assert!(replies.next().await.is_none());

    server.stop();
}
