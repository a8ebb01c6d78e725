//! Catalog service implementation.
//!
//! Create/update/delete are unary calls whose business outcomes travel as
//! display messages; `ListConcerts` streams a one-shot snapshot of the
//! catalog. Deletion consults the booking ledger before the existence check,
//! so sold inventory is never silently erased.

use std::pin::Pin;
use std::sync::Arc;

use boxoffice_proto::proto::{
    CatalogActionResponse, Concert, CreateConcertRequest, DeleteConcertRequest,
    ListConcertsRequest, UpdateConcertRequest, catalog_service_server::CatalogService,
};
use boxoffice_store::{BookingLedger, CatalogStore};
use boxoffice_types::{StoreError, validation};
use futures::Stream;
use tonic::{Request, Response, Status};

use crate::services::store_fault;

/// Concert catalog management service.
#[derive(bon::Builder)]
pub struct CatalogServiceImpl {
    /// Concert record store.
    catalog: Arc<dyn CatalogStore>,
    /// Booking ledger, consulted as the delete guard.
    ledger: Arc<dyn BookingLedger>,
}

fn require_iso_date(date: &str) -> Result<(), Status> {
    if validation::is_iso_date(date) {
        Ok(())
    } else {
        Err(Status::invalid_argument(format!(
            "invalid date '{}': expected YYYY-MM-DD",
            date
        )))
    }
}

fn action(message: String) -> Response<CatalogActionResponse> {
    Response::new(CatalogActionResponse { message })
}

#[tonic::async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn create_concert(
        &self,
        request: Request<CreateConcertRequest>,
    ) -> Result<Response<CatalogActionResponse>, Status> {
        let req = request.into_inner();

        if req.name.is_empty() {
            return Err(Status::invalid_argument("concert name must be non-empty"));
        }
        require_iso_date(&req.date)?;

        match self.catalog.insert(boxoffice_types::Concert::from(&req)) {
            Ok(()) => {
                tracing::info!(
                    service = "catalog",
                    method = "create_concert",
                    concert = %req.name,
                    tickets = req.ticket_count,
                    outcome = "created",
                );
                Ok(action(format!(
                    "Concert '{}' created with {} tickets.",
                    req.name, req.ticket_count
                )))
            }
            Err(StoreError::DuplicateKey { .. }) => {
                tracing::info!(
                    service = "catalog",
                    method = "create_concert",
                    concert = %req.name,
                    outcome = "duplicate",
                );
                Ok(action(format!("Concert '{}' already exists.", req.name)))
            }
            Err(err) => Err(store_fault(&err)),
        }
    }

    type ListConcertsStream = Pin<Box<dyn Stream<Item = Result<Concert, Status>> + Send>>;

    async fn list_concerts(
        &self,
        _request: Request<ListConcertsRequest>,
    ) -> Result<Response<Self::ListConcertsStream>, Status> {
        // One-shot snapshot: later mutations are not reflected in an
        // in-flight listing.
        let snapshot = self.catalog.scan().map_err(|e| store_fault(&e))?;

        tracing::info!(
            service = "catalog",
            method = "list_concerts",
            count = snapshot.len(),
            "Streaming catalog snapshot"
        );

        let stream = futures::stream::iter(
            snapshot.into_iter().map(|concert| Ok(Concert::from(concert))),
        );
        Ok(Response::new(Box::pin(stream)))
    }

    async fn update_concert(
        &self,
        request: Request<UpdateConcertRequest>,
    ) -> Result<Response<CatalogActionResponse>, Status> {
        let req = request.into_inner();
        require_iso_date(&req.date)?;

        let matched = self
            .catalog
            .update_details(&req.name, &req.location, &req.date)
            .map_err(|e| store_fault(&e))?;

        tracing::info!(
            service = "catalog",
            method = "update_concert",
            concert = %req.name,
            outcome = if matched { "updated" } else { "not_found" },
        );

        if matched {
            Ok(action(format!("Concert '{}' updated.", req.name)))
        } else {
            Ok(action(format!("Concert '{}' not found.", req.name)))
        }
    }

    async fn delete_concert(
        &self,
        request: Request<DeleteConcertRequest>,
    ) -> Result<Response<CatalogActionResponse>, Status> {
        let req = request.into_inner();

        // Ledger guard comes before the existence check: a booked concert
        // reports the guard failure even if racing deletes already removed it.
        if self.ledger.exists_for(&req.name).map_err(|e| store_fault(&e))? {
            tracing::info!(
                service = "catalog",
                method = "delete_concert",
                concert = %req.name,
                outcome = "guarded",
            );
            return Ok(action(format!(
                "Concert '{}' has bookings and cannot be deleted.",
                req.name
            )));
        }

        let removed = self.catalog.remove(&req.name).map_err(|e| store_fault(&e))?;

        tracing::info!(
            service = "catalog",
            method = "delete_concert",
            concert = %req.name,
            outcome = if removed { "deleted" } else { "not_found" },
        );

        if removed {
            Ok(action(format!("Concert '{}' deleted.", req.name)))
        } else {
            Ok(action(format!("Concert '{}' not found.", req.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_store::{MemoryCatalog, MemoryLedger};
    use boxoffice_types::Booking;
    use futures::StreamExt;

    fn service() -> (CatalogServiceImpl, Arc<MemoryCatalog>, Arc<MemoryLedger>) {
        let catalog = Arc::new(MemoryCatalog::new());
        let ledger = Arc::new(MemoryLedger::new());
        let svc = CatalogServiceImpl::builder()
            .catalog(catalog.clone())
            .ledger(ledger.clone())
            .build();
        (svc, catalog, ledger)
    }

    fn create(name: &str, tickets: u32) -> Request<CreateConcertRequest> {
        Request::new(CreateConcertRequest {
            name: name.to_string(),
            location: "Arena".to_string(),
            date: "2026-09-01".to_string(),
            ticket_count: tickets,
        })
    }

    #[tokio::test]
    async fn create_reports_the_stored_ticket_count() {
        let (svc, _, _) = service();
        let res = svc.create_concert(create("Gala", 120)).await.unwrap();
        assert!(res.get_ref().message.contains("120"));
    }

    #[tokio::test]
    async fn duplicate_create_is_a_business_failure_not_a_fault() {
        let (svc, _, _) = service();
        svc.create_concert(create("Gala", 120)).await.unwrap();
        let res = svc.create_concert(create("Gala", 5)).await.unwrap();
        assert!(res.get_ref().message.contains("already exists"));
    }

    #[tokio::test]
    async fn malformed_date_is_rejected_as_invalid_argument() {
        let (svc, _, _) = service();
        let mut req = create("Gala", 10).into_inner();
        req.date = "01-09-2026".to_string();
        let err = svc.create_concert(Request::new(req)).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn list_streams_a_name_ordered_snapshot() {
        let (svc, _, _) = service();
        svc.create_concert(create("Zenith", 1)).await.unwrap();
        svc.create_concert(create("Aurora", 2)).await.unwrap();

        let stream = svc
            .list_concerts(Request::new(ListConcertsRequest {}))
            .await
            .unwrap()
            .into_inner();
        let names: Vec<String> = stream
            .map(|item| item.unwrap().name)
            .collect()
            .await;
        assert_eq!(names, vec!["Aurora".to_string(), "Zenith".to_string()]);
    }

    #[tokio::test]
    async fn update_touches_details_but_reports_missing_rows() {
        let (svc, catalog, _) = service();
        svc.create_concert(create("Gala", 10)).await.unwrap();

        let res = svc
            .update_concert(Request::new(UpdateConcertRequest {
                name: "Gala".to_string(),
                location: "Stadium".to_string(),
                date: "2026-10-10".to_string(),
            }))
            .await
            .unwrap();
        assert!(res.get_ref().message.contains("updated"));

        let row = catalog.get("Gala").unwrap().unwrap();
        assert_eq!(row.location, "Stadium");
        // Inventory is not touched by detail updates.
        assert_eq!(row.ticket_count, 10);

        let missing = svc
            .update_concert(Request::new(UpdateConcertRequest {
                name: "Ghost".to_string(),
                location: "Anywhere".to_string(),
                date: "2026-10-10".to_string(),
            }))
            .await
            .unwrap();
        assert!(missing.get_ref().message.contains("not found"));
    }

    #[tokio::test]
    async fn booked_concert_cannot_be_deleted() {
        let (svc, catalog, ledger) = service();
        svc.create_concert(create("Gala", 10)).await.unwrap();
        ledger.append(Booking::priced("Gala", 2)).unwrap();

        let res = svc
            .delete_concert(Request::new(DeleteConcertRequest {
                name: "Gala".to_string(),
            }))
            .await
            .unwrap();
        assert!(res.get_ref().message.contains("cannot be deleted"));
        assert!(catalog.get("Gala").unwrap().is_some());
    }

    #[tokio::test]
    async fn unbooked_concert_deletes_cleanly() {
        let (svc, catalog, _) = service();
        svc.create_concert(create("Gala", 10)).await.unwrap();

        let res = svc
            .delete_concert(Request::new(DeleteConcertRequest {
                name: "Gala".to_string(),
            }))
            .await
            .unwrap();
        assert!(res.get_ref().message.contains("deleted"));
        assert!(catalog.get("Gala").unwrap().is_none());

        let again = svc
            .delete_concert(Request::new(DeleteConcertRequest {
                name: "Gala".to_string(),
            }))
            .await
            .unwrap();
        assert!(again.get_ref().message.contains("not found"));
    }
}
