//! Conversions between domain types and their protobuf counterparts.
//!
//! The domain and wire representations of a concert are structurally
//! identical today; keeping the conversions in one place means the server
//! code never constructs proto types field by field.

use boxoffice_types::Concert;

use crate::proto;

impl From<Concert> for proto::Concert {
    fn from(concert: Concert) -> Self {
        Self {
            name: concert.name,
            location: concert.location,
            date: concert.date,
            ticket_count: concert.ticket_count,
        }
    }
}

impl From<proto::Concert> for Concert {
    fn from(concert: proto::Concert) -> Self {
        Self {
            name: concert.name,
            location: concert.location,
            date: concert.date,
            ticket_count: concert.ticket_count,
        }
    }
}

impl From<&proto::CreateConcertRequest> for Concert {
    fn from(request: &proto::CreateConcertRequest) -> Self {
        Self {
            name: request.name.clone(),
            location: request.location.clone(),
            date: request.date.clone(),
            ticket_count: request.ticket_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_round_trips_through_proto() {
        let concert = Concert {
            name: "Harbor Lights".to_string(),
            location: "Pier 14".to_string(),
            date: "2026-03-01".to_string(),
            ticket_count: 250,
        };

        let wire: proto::Concert = concert.clone().into();
        let back: Concert = wire.into();

        assert_eq!(back, concert);
    }

    #[test]
    fn create_request_maps_to_concert() {
        let request = proto::CreateConcertRequest {
            name: "Open Air".to_string(),
            location: "Riverside".to_string(),
            date: "2026-07-19".to_string(),
            ticket_count: 1_000,
        };

        let concert = Concert::from(&request);
        assert_eq!(concert.name, "Open Air");
        assert_eq!(concert.ticket_count, 1_000);
    }
}
