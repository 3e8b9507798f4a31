use async_trait::async_trait;
use time::Date;
use crate::errors::BookingError;
use crate::models::visiter::{NewVisiter, Visiter, VisiterId};

pub mod memory_repo;
pub mod postgres_repo;

/// Storage for visit reservations. Cancelled rows are never returned.
#[async_trait]
pub trait VisiterRepo: Send + Sync {
    /// Live reservations ordered by id.
    async fn list(&self) -> anyhow::Result<Vec<Visiter>>;

    async fn list_for_date(&self, date: Date) -> anyhow::Result<Vec<Visiter>>;

    async fn get(&self, id: VisiterId) -> anyhow::Result<Option<Visiter>>;

    /// Persist `new` if the day still has room for it. The capacity check and
    /// the insert happen atomically with respect to other inserts.
    async fn insert_within_capacity(&self, new: NewVisiter) -> Result<Visiter, BookingError>;

    /// Soft-delete a reservation, returns false when there was nothing to cancel.
    async fn cancel(&self, id: VisiterId) -> anyhow::Result<bool>;
}
