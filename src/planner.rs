//! Client-side booking flow.
//!
//! The planner keeps the last reservation list fetched from the service and
//! runs every pre-check against it before submitting anything. After each
//! submission or cancellation the list is fetched again, so no derived state
//! outlives a request.

use reqwest::StatusCode;
use time::{Date, Duration};
use tracing::{info, warn};
use crate::capacity;
use crate::client::{ApiError, VisitClient};
use crate::errors::BookingError;
use crate::models::visiter::{Availability, NewVisiter, Visiter, VisiterId};

/// Number of days, starting today, a visit can be booked for.
pub const BOOKING_WINDOW_DAYS: i64 = 7;

/// The bookable days, today first.
pub fn date_options(today: Date) -> Vec<Date> {
    (0..BOOKING_WINDOW_DAYS)
        .filter_map(|offset| today.checked_add(Duration::days(offset)))
        .collect()
}

pub struct VisitPlanner {
    client: VisitClient,
    visiters: Vec<Visiter>,
}

impl VisitPlanner {
    /// Build a planner and fetch the current reservations.
    pub async fn connect(client: VisitClient) -> anyhow::Result<Self> {
        let mut planner = Self {
            client,
            visiters: Vec::new(),
        };
        planner.refresh().await?;
        Ok(planner)
    }

    pub fn visiters(&self) -> &[Visiter] {
        &self.visiters
    }

    pub async fn refresh(&mut self) -> anyhow::Result<&[Visiter]> {
        self.visiters = self.client.list_visiters().await?;
        Ok(&self.visiters)
    }

    pub fn status(&self, date: Date) -> Availability {
        Availability::for_day(&self.visiters, date)
    }

    pub fn existing_booking(&self, date: Date) -> Option<&Visiter> {
        self.visiters.iter().find(|v| v.visit_date == date)
    }

    /// Checks run before a booking is submitted, in the order the user sees
    /// them: party size, one booking per day, then capacity.
    pub fn check(&self, date: Date, count: u32) -> Result<(), BookingError> {
        if !capacity::is_party_size(count) {
            return Err(BookingError::InvalidPartySize(count));
        }
        if self.existing_booking(date).is_some() {
            return Err(BookingError::DuplicateDate(date));
        }
        if !capacity::can_book(&self.visiters, date, count) {
            return Err(BookingError::CapacityExceeded {
                date,
                remaining: capacity::remaining(&self.visiters, date),
            });
        }
        Ok(())
    }

    pub async fn book(
        &mut self,
        date: Date,
        count: u32,
        user_id: i64,
        visiting_id: i64,
    ) -> Result<Visiter, BookingError> {
        self.check(date, count)?;

        let new = NewVisiter {
            visit_date: date,
            number_of_visiter: count,
            user_id,
            visiting_id,
        };
        let submitted = self.client.create_visiter(&new).await;
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh reservations after booking: {:#}", e);
        }

        match submitted {
            Ok(visiter) => {
                info!("Booked {} visitors on {}", visiter.number_of_visiter, visiter.visit_date);
                Ok(visiter)
            }
            Err(e) => Err(self.submission_error(e, date, count)),
        }
    }

    /// Translate a rejected submission, using the list fetched after it.
    fn submission_error(&self, error: anyhow::Error, date: Date, count: u32) -> BookingError {
        if has_status(&error, StatusCode::CONFLICT) {
            return BookingError::CapacityExceeded {
                date,
                remaining: capacity::remaining(&self.visiters, date),
            };
        }

        let party_size_message = BookingError::InvalidPartySize(count).to_string();
        let is_party_size_rejection = error
            .downcast_ref::<ApiError>()
            .map_or(false, |api| api.status == StatusCode::BAD_REQUEST && api.message == party_size_message);
        if is_party_size_rejection {
            return BookingError::InvalidPartySize(count);
        }

        BookingError::Request(error)
    }

    pub async fn cancel(&mut self, id: VisiterId) -> Result<(), BookingError> {
        let cancelled = self.client.cancel_visiter(id).await;
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh reservations after cancelling: {:#}", e);
        }

        match cancelled {
            Ok(()) => Ok(()),
            Err(e) if has_status(&e, StatusCode::NOT_FOUND) => Err(BookingError::NotFound(id)),
            Err(e) => Err(BookingError::Request(e)),
        }
    }
}

fn has_status(error: &anyhow::Error, status: StatusCode) -> bool {
    error
        .downcast_ref::<ApiError>()
        .map_or(false, |api| api.status == status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn planner_with(visiters: Vec<Visiter>) -> VisitPlanner {
        VisitPlanner {
            client: VisitClient::new("http://127.0.0.1:9"),
            visiters,
        }
    }

    fn visiter(id: VisiterId, visit_date: Date, count: u32) -> Visiter {
        NewVisiter {
            visit_date,
            number_of_visiter: count,
            user_id: 1,
            visiting_id: 2,
        }
        .into_visiter(id, datetime!(2025-02-01 08:00 UTC))
    }

    #[test]
    fn offers_a_week_of_dates() {
        let days = date_options(date!(2025 - 02 - 26));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date!(2025 - 02 - 26));
        assert_eq!(days[3], date!(2025 - 03 - 01));
        assert_eq!(days[6], date!(2025 - 03 - 04));
    }

    #[test]
    fn rejects_party_sizes_outside_the_offered_set() {
        let planner = planner_with(Vec::new());
        assert!(matches!(
            planner.check(date!(2025 - 02 - 10), 6),
            Err(BookingError::InvalidPartySize(6))
        ));
        assert!(matches!(
            planner.check(date!(2025 - 02 - 10), 0),
            Err(BookingError::InvalidPartySize(0))
        ));
        assert!(planner.check(date!(2025 - 02 - 10), 5).is_ok());
    }

    #[test]
    fn rejects_a_second_booking_on_the_same_day() {
        let planner = planner_with(vec![visiter(1, date!(2025 - 02 - 10), 1)]);
        assert!(matches!(
            planner.check(date!(2025 - 02 - 10), 1),
            Err(BookingError::DuplicateDate(_))
        ));
        assert!(planner.check(date!(2025 - 02 - 11), 1).is_ok());
    }

    #[test]
    fn duplicate_day_wins_over_capacity() {
        let day = date!(2025 - 02 - 10);
        let planner = planner_with(vec![visiter(1, day, 100)]);
        assert!(matches!(planner.check(day, 1), Err(BookingError::DuplicateDate(_))));
    }

    fn api_error(status: StatusCode, message: &str) -> anyhow::Error {
        anyhow::Error::new(ApiError {
            status,
            message: message.to_string(),
        })
    }

    #[test]
    fn classifies_rejected_submissions() {
        let day = date!(2025 - 02 - 10);
        let planner = planner_with(vec![visiter(1, day, 99)]);

        let conflict = api_error(StatusCode::CONFLICT, "booking failed, only 1 places left on 2025-02-10");
        assert!(matches!(
            planner.submission_error(conflict, day, 2),
            BookingError::CapacityExceeded { remaining: 1, .. }
        ));

        let party = api_error(StatusCode::BAD_REQUEST, "party size must be between 1 and 5, got 0");
        assert!(matches!(
            planner.submission_error(party, day, 0),
            BookingError::InvalidPartySize(0)
        ));

        let bad_date = api_error(
            StatusCode::BAD_REQUEST,
            "Failed to deserialize the JSON body into the target type: VisitDate: invalid visit date",
        );
        assert!(matches!(planner.submission_error(bad_date, day, 2), BookingError::Request(_)));

        let transport = anyhow::anyhow!("connection refused");
        assert!(matches!(planner.submission_error(transport, day, 2), BookingError::Request(_)));
    }

    #[test]
    fn status_reflects_the_fetched_list() {
        let day = date!(2025 - 02 - 10);
        let planner = planner_with(vec![
            visiter(1, day, 95),
            visiter(2, day, 2),
            visiter(3, date!(2025 - 02 - 11), 5),
        ]);
        let status = planner.status(day);
        assert_eq!(status.booked, 97);
        assert_eq!(status.remaining, 3);
        assert_eq!(status.party_sizes, vec![1, 2, 3]);
        assert_eq!(planner.existing_booking(day).map(|v| v.id), Some(1));
    }
}
