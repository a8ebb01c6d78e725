//! Booking service implementation.
//!
//! A booking is resolved entirely through one store operation:
//! [`CatalogStore::decrement_tickets`] evaluates the inventory guard and
//! applies the decrement as a single indivisible step, so concurrent
//! purchases can never oversell. On success a ledger row is appended; the
//! row is what later guards catalog deletion.
//!
//! `BookTickets` consumes a client stream where each item is its own atomic
//! unit. Item failures accumulate in the aggregate counts; only a store
//! fault or a broken inbound stream converts the whole batch into an
//! `INTERNAL_FAULT` aggregate, and even then items already applied stay
//! applied.

use std::sync::Arc;

use boxoffice_proto::proto::{
    BatchBookingResponse, BatchStatus, BookTicketRequest, BookTicketResponse,
    booking_service_server::BookingService,
};
use boxoffice_store::{BookingLedger, CatalogStore, DecrementOutcome};
use boxoffice_types::{Booking, StoreError};
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};

use crate::services::store_fault;

/// Ticket purchasing service.
#[derive(bon::Builder)]
pub struct BookingServiceImpl {
    /// Concert inventory store.
    catalog: Arc<dyn CatalogStore>,
    /// Append-only booking ledger.
    ledger: Arc<dyn BookingLedger>,
}

/// Resolution of one purchase item.
enum ItemOutcome {
    /// Inventory was decremented and the booking ledgered.
    Booked(Booking),
    /// The item was refused; the store was left untouched (or, for the
    /// guard, unchanged). Carries the display reason.
    Rejected(String),
}

impl BookingServiceImpl {
    /// Applies one purchase item: guard-and-decrement, then ledger append.
    ///
    /// Business refusals come back as [`ItemOutcome::Rejected`]; only a
    /// store-layer fault surfaces as `Err`.
    fn apply_item(&self, concert_name: &str, quantity: u32) -> Result<ItemOutcome, StoreError> {
        if quantity == 0 {
            return Ok(ItemOutcome::Rejected(
                "Quantity must be a positive integer.".to_string(),
            ));
        }

        match self.catalog.decrement_tickets(concert_name, quantity)? {
            DecrementOutcome::Applied { remaining } => {
                let booking = Booking::priced(concert_name, quantity);
                self.ledger.append(booking.clone())?;
                tracing::info!(
                    service = "booking",
                    concert = %concert_name,
                    quantity,
                    remaining,
                    outcome = "booked",
                );
                Ok(ItemOutcome::Booked(booking))
            }
            DecrementOutcome::Insufficient { available } => {
                tracing::info!(
                    service = "booking",
                    concert = %concert_name,
                    quantity,
                    available,
                    outcome = "insufficient",
                );
                Ok(ItemOutcome::Rejected(format!(
                    "Only {} tickets left for '{}'.",
                    available, concert_name
                )))
            }
            DecrementOutcome::NotFound => {
                tracing::info!(
                    service = "booking",
                    concert = %concert_name,
                    quantity,
                    outcome = "not_found",
                );
                Ok(ItemOutcome::Rejected(format!(
                    "Concert '{}' not found.",
                    concert_name
                )))
            }
        }
    }

    /// Drains a batch stream, applying each item independently.
    ///
    /// Never fails: faults are folded into the `INTERNAL_FAULT` aggregate at
    /// this boundary so a broken batch cannot take down the session with a
    /// raw transport error. Partial progress stays committed.
    async fn run_batch<S>(&self, mut requests: S) -> BatchBookingResponse
    where
        S: Stream<Item = Result<BookTicketRequest, Status>> + Unpin,
    {
        let mut received = 0u64;
        let mut succeeded = 0u32;
        let mut failed = 0u32;

        while let Some(item) = requests.next().await {
            let req = match item {
                Ok(req) => req,
                Err(status) => {
                    tracing::warn!(
                        service = "booking",
                        method = "book_tickets",
                        error = %status,
                        succeeded,
                        failed,
                        "Inbound batch stream broke"
                    );
                    return fault_aggregate(succeeded, failed);
                }
            };
            received += 1;

            match self.apply_item(&req.concert_name, req.quantity) {
                Ok(ItemOutcome::Booked(_)) => succeeded += 1,
                Ok(ItemOutcome::Rejected(_)) => failed += 1,
                Err(err) => {
                    tracing::error!(
                        service = "booking",
                        method = "book_tickets",
                        error = %err,
                        succeeded,
                        failed,
                        "Store fault mid-batch"
                    );
                    return fault_aggregate(succeeded, failed);
                }
            }
        }

        if received == 0 {
            return BatchBookingResponse {
                status: BatchStatus::NothingProcessed.into(),
                message: "No booking requests received.".to_string(),
                succeeded: 0,
                failed: 0,
            };
        }

        tracing::info!(
            service = "booking",
            method = "book_tickets",
            succeeded,
            failed,
            outcome = "completed",
        );
        BatchBookingResponse {
            status: BatchStatus::Completed.into(),
            message: format!("Succeeded: {}, Failed: {}", succeeded, failed),
            succeeded,
            failed,
        }
    }
}

fn fault_aggregate(succeeded: u32, failed: u32) -> BatchBookingResponse {
    BatchBookingResponse {
        status: BatchStatus::InternalFault.into(),
        message: format!(
            "Batch aborted by an internal fault; {} booked item(s) remain applied.",
            succeeded
        ),
        succeeded,
        failed,
    }
}

#[tonic::async_trait]
impl BookingService for BookingServiceImpl {
    async fn book_ticket(
        &self,
        request: Request<BookTicketRequest>,
    ) -> Result<Response<BookTicketResponse>, Status> {
        let req = request.into_inner();

        let response = match self
            .apply_item(&req.concert_name, req.quantity)
            .map_err(|e| store_fault(&e))?
        {
            ItemOutcome::Booked(booking) => BookTicketResponse {
                message: format!(
                    "Booked {} tickets for '{}'; total price {}.",
                    req.quantity, req.concert_name, booking.total_price
                ),
                total_price: booking.total_price,
            },
            ItemOutcome::Rejected(reason) => BookTicketResponse {
                message: reason,
                total_price: 0,
            },
        };
        Ok(Response::new(response))
    }

    async fn book_tickets(
        &self,
        request: Request<Streaming<BookTicketRequest>>,
    ) -> Result<Response<BatchBookingResponse>, Status> {
        let response = self.run_batch(request.into_inner()).await;
        Ok(Response::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_store::{MemoryCatalog, MemoryLedger};
    use boxoffice_types::{Concert, TICKET_UNIT_PRICE};

    fn service_with(
        concerts: &[(&str, u32)],
    ) -> (BookingServiceImpl, Arc<MemoryCatalog>, Arc<MemoryLedger>) {
        let catalog = Arc::new(MemoryCatalog::new());
        for (name, tickets) in concerts {
            catalog
                .insert(Concert {
                    name: name.to_string(),
                    location: "Arena".to_string(),
                    date: "2026-09-01".to_string(),
                    ticket_count: *tickets,
                })
                .unwrap();
        }
        let ledger = Arc::new(MemoryLedger::new());
        let svc = BookingServiceImpl::builder()
            .catalog(catalog.clone())
            .ledger(ledger.clone())
            .build();
        (svc, catalog, ledger)
    }

    fn item(name: &str, quantity: u32) -> BookTicketRequest {
        BookTicketRequest {
            concert_name: name.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn booking_decrements_and_prices_the_tickets() {
        let (svc, catalog, ledger) = service_with(&[("Gala", 10)]);

        let res = svc
            .book_ticket(Request::new(item("Gala", 3)))
            .await
            .unwrap();
        assert_eq!(res.get_ref().total_price, 3 * TICKET_UNIT_PRICE);

        assert_eq!(catalog.get("Gala").unwrap().unwrap().ticket_count, 7);
        assert!(ledger.exists_for("Gala").unwrap());
    }

    #[tokio::test]
    async fn insufficient_inventory_is_refused_without_change() {
        let (svc, catalog, ledger) = service_with(&[("Gala", 2)]);

        let res = svc
            .book_ticket(Request::new(item("Gala", 3)))
            .await
            .unwrap();
        assert_eq!(res.get_ref().total_price, 0);
        assert!(res.get_ref().message.contains("2 tickets left"));

        assert_eq!(catalog.get("Gala").unwrap().unwrap().ticket_count, 2);
        assert!(!ledger.exists_for("Gala").unwrap());
    }

    #[tokio::test]
    async fn unknown_concert_and_zero_quantity_are_refusals() {
        let (svc, _, ledger) = service_with(&[("Gala", 2)]);

        let missing = svc
            .book_ticket(Request::new(item("Ghost", 1)))
            .await
            .unwrap();
        assert_eq!(missing.get_ref().total_price, 0);

        let zero = svc.book_ticket(Request::new(item("Gala", 0))).await.unwrap();
        assert_eq!(zero.get_ref().total_price, 0);
        assert!(zero.get_ref().message.contains("positive"));
        assert!(!ledger.exists_for("Gala").unwrap());
    }

    #[tokio::test]
    async fn batch_counts_item_outcomes_independently() {
        let (svc, catalog, _) = service_with(&[("Gala", 10)]);

        let requests = futures::stream::iter(vec![
            Ok(item("Gala", 2)),
            Ok(item("Ghost", 1)),
            Ok(item("Gala", 3)),
        ]);
        let res = svc.run_batch(requests).await;

        assert_eq!(res.status, BatchStatus::Completed as i32);
        assert_eq!(res.succeeded, 2);
        assert_eq!(res.failed, 1);
        assert_eq!(catalog.get("Gala").unwrap().unwrap().ticket_count, 5);
    }

    #[tokio::test]
    async fn empty_batch_is_nothing_processed_not_a_zero_success() {
        let (svc, _, _) = service_with(&[("Gala", 10)]);

        let requests = futures::stream::iter(Vec::<Result<BookTicketRequest, Status>>::new());
        let res = svc.run_batch(requests).await;

        assert_eq!(res.status, BatchStatus::NothingProcessed as i32);
        assert_eq!(res.succeeded, 0);
        assert_eq!(res.failed, 0);
    }

    #[tokio::test]
    async fn broken_inbound_stream_keeps_partial_progress() {
        let (svc, catalog, _) = service_with(&[("Gala", 10)]);

        let requests = futures::stream::iter(vec![
            Ok(item("Gala", 2)),
            Err(Status::unavailable("connection reset")),
            Ok(item("Gala", 3)),
        ]);
        let res = svc.run_batch(requests).await;

        assert_eq!(res.status, BatchStatus::InternalFault as i32);
        assert_eq!(res.succeeded, 1);
        // The item already applied stays applied; the one after the break
        // was never consumed.
        assert_eq!(catalog.get("Gala").unwrap().unwrap().ticket_count, 8);
    }

    #[tokio::test]
    async fn concurrent_single_bookings_never_oversell() {
        let (svc, catalog, ledger) = service_with(&[("Gala", 5)]);
        let svc = Arc::new(svc);

        // Two racers for 3 of the 5 remaining tickets: exactly one can win.
        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.book_ticket(Request::new(item("Gala", 3))).await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.book_ticket(Request::new(item("Gala", 3))).await }
        });

        let prices = [
            a.await.unwrap().unwrap().into_inner().total_price,
            b.await.unwrap().unwrap().into_inner().total_price,
        ];
        let wins = prices.iter().filter(|p| **p > 0).count();
        assert_eq!(wins, 1);
        assert_eq!(catalog.get("Gala").unwrap().unwrap().ticket_count, 2);
        assert_eq!(ledger.len(), 1);
    }
}
