use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use crate::capacity;
use crate::errors::BookingError;
use crate::models::visiter::{NewVisiter, Visiter, VisiterId};
use crate::repositories::VisiterRepo;

/// Process-local store, for running without Postgres and for tests.
#[derive(Default)]
pub struct InMemoryVisiterRepo {
    rows: RwLock<Vec<Visiter>>,
}

impl InMemoryVisiterRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisiterRepo for InMemoryVisiterRepo {
    async fn list(&self) -> anyhow::Result<Vec<Visiter>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|v| v.deleted_at.is_none()).cloned().collect())
    }

    async fn list_for_date(&self, date: Date) -> anyhow::Result<Vec<Visiter>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|v| v.deleted_at.is_none() && v.visit_date == date)
            .cloned()
            .collect())
    }

    async fn get(&self, id: VisiterId) -> anyhow::Result<Option<Visiter>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|v| v.id == id && v.deleted_at.is_none()).cloned())
    }

    async fn insert_within_capacity(&self, new: NewVisiter) -> Result<Visiter, BookingError> {
        let mut rows = self.rows.write().await;
        let booked: Vec<&Visiter> = rows.iter().filter(|v| v.deleted_at.is_none()).collect();

        if !capacity::can_book(&booked, new.visit_date, new.number_of_visiter) {
            return Err(BookingError::CapacityExceeded {
                date: new.visit_date,
                remaining: capacity::remaining(&booked, new.visit_date),
            });
        }

        // ids keep growing after cancellations, as with a serial column
        let id = rows.last().map_or(1, |v| v.id + 1);
        let visiter = new.into_visiter(id, OffsetDateTime::now_utc());
        rows.push(visiter.clone());
        Ok(visiter)
    }

    async fn cancel(&self, id: VisiterId) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|v| v.id == id && v.deleted_at.is_none()) {
            Some(visiter) => {
                let now = OffsetDateTime::now_utc();
                visiter.deleted_at = Some(now);
                visiter.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
