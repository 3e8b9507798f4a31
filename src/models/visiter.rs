use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use time::{Date, OffsetDateTime};
use crate::capacity::{self, DayBooking};
use crate::models::visit_day::VisitDay;

pub type VisiterId = i64;

/// A persisted visit reservation.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Visiter {
    #[serde(rename = "ID")]
    pub id: VisiterId,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "UpdatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(rename = "DeletedAt", with = "time::serde::rfc3339::option", default)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(rename = "VisitDate")]
    #[serde_as(as = "VisitDay")]
    pub visit_date: Date,
    #[serde(rename = "NumberOfVisiter")]
    pub number_of_visiter: u32,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "VisitingID")]
    pub visiting_id: i64,
}

/// Booking request body. Also accepts the camel-case field names.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewVisiter {
    #[serde(rename = "VisitDate", alias = "date")]
    #[serde_as(as = "VisitDay")]
    pub visit_date: Date,
    #[serde(rename = "NumberOfVisiter", alias = "visitorCount")]
    pub number_of_visiter: u32,
    #[serde(rename = "UserID", alias = "userId", default)]
    pub user_id: i64,
    #[serde(rename = "VisitingID", alias = "visitingId", default)]
    pub visiting_id: i64,
}

impl NewVisiter {
    pub fn into_visiter(self, id: VisiterId, now: OffsetDateTime) -> Visiter {
        Visiter {
            id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            visit_date: self.visit_date,
            number_of_visiter: self.number_of_visiter,
            user_id: self.user_id,
            visiting_id: self.visiting_id,
        }
    }
}

impl DayBooking for Visiter {
    fn day(&self) -> Date {
        self.visit_date
    }

    fn visitor_count(&self) -> u32 {
        self.number_of_visiter
    }
}

impl DayBooking for NewVisiter {
    fn day(&self) -> Date {
        self.visit_date
    }

    fn visitor_count(&self) -> u32 {
        self.number_of_visiter
    }
}

/// Booking summary of one day.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Availability {
    #[serde_as(as = "VisitDay")]
    pub date: Date,
    pub booked: u32,
    pub remaining: u32,
    pub capacity: u32,
    pub party_sizes: Vec<u32>,
}

impl Availability {
    pub fn for_day<R: DayBooking>(reservations: &[R], date: Date) -> Self {
        Self {
            date,
            booked: capacity::booked_count(reservations, date),
            remaining: capacity::remaining(reservations, date),
            capacity: capacity::DAILY_CAPACITY,
            party_sizes: capacity::offered_party_sizes(reservations, date),
        }
    }
}
