use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::{NoTls, Row};
use time::Date;
use tracing::{debug, info, warn};
use crate::capacity;
use crate::errors::BookingError;
use crate::models::visiter::{NewVisiter, Visiter, VisiterId};
use crate::repositories::VisiterRepo;

pub const RETRY_LIMIT: usize = 5;

const CREATE_VISITERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS visiters (\
    id BIGSERIAL PRIMARY KEY, \
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
    deleted_at TIMESTAMPTZ NULL, \
    visit_date DATE NOT NULL, \
    number_of_visiter INTEGER NOT NULL CHECK (number_of_visiter > 0), \
    user_id BIGINT NOT NULL, \
    visiting_id BIGINT NOT NULL\
);";

const CREATE_VISIT_DATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_visiters_visit_date \
    ON visiters (visit_date) WHERE deleted_at IS NULL;";

const VISITER_COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, visit_date, number_of_visiter, user_id, visiting_id";

pub struct PostgresConnectionRepo {
    postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    /// Create the reservation table if this database has never seen it.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.batch_execute(&format!("{} {}", CREATE_VISITERS_TABLE, CREATE_VISIT_DATE_INDEX))
            .await
            .context("Failed to create the visiters table")?;
        info!("Visiters table is ready");
        Ok(())
    }
}

#[async_trait]
impl VisiterRepo for PostgresConnectionRepo {
    async fn list(&self) -> anyhow::Result<Vec<Visiter>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "SELECT {} FROM visiters WHERE deleted_at IS NULL ORDER BY id;",
            VISITER_COLUMNS
        );

        let rows = conn
            .query(&stmt, &[])
            .await
            .context("Failed to retrieve visiters")?;

        rows.iter().map(parse_row_into_visiter).collect()
    }

    async fn list_for_date(&self, date: Date) -> anyhow::Result<Vec<Visiter>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "SELECT {} FROM visiters WHERE deleted_at IS NULL AND visit_date = $1 ORDER BY id;",
            VISITER_COLUMNS
        );

        let rows = conn
            .query(&stmt, &[&date])
            .await
            .with_context(|| format!("Failed to retrieve visiters on {}", date))?;

        rows.iter().map(parse_row_into_visiter).collect()
    }

    async fn get(&self, id: VisiterId) -> anyhow::Result<Option<Visiter>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = format!(
            "SELECT {} FROM visiters WHERE deleted_at IS NULL AND id = $1;",
            VISITER_COLUMNS
        );

        let row = conn
            .query_opt(&stmt, &[&id])
            .await
            .with_context(|| format!("Failed to retrieve visiter with id: {}", id))?;

        row.as_ref().map(parse_row_into_visiter).transpose()
    }

    async fn insert_within_capacity(&self, new: NewVisiter) -> Result<Visiter, BookingError> {
        let mut conn = self.get_postgres_connection().await?;
        let tx = conn
            .transaction()
            .await
            .context("Failed to open a transaction")?;

        // blocks concurrent inserts until commit, reads stay unaffected
        tx.execute("LOCK TABLE visiters IN SHARE ROW EXCLUSIVE MODE;", &[])
            .await
            .context("Failed to lock the visiters table")?;

        let rows = tx
            .query(
                "SELECT visit_date, number_of_visiter FROM visiters \
                 WHERE deleted_at IS NULL AND visit_date = $1;",
                &[&new.visit_date],
            )
            .await
            .context("Failed to read the day's bookings")?;
        let booked = rows
            .iter()
            .map(|row| Ok((row.try_get::<_, Date>("visit_date")?, visitor_count(row)?)))
            .collect::<anyhow::Result<Vec<(Date, u32)>>>()?;

        if !capacity::can_book(&booked, new.visit_date, new.number_of_visiter) {
            let remaining = capacity::remaining(&booked, new.visit_date);
            debug!("Rejected booking of {} on {}, {} places left", new.number_of_visiter, new.visit_date, remaining);
            return Err(BookingError::CapacityExceeded {
                date: new.visit_date,
                remaining,
            });
        }

        let count = i32::try_from(new.number_of_visiter)
            .map_err(|_| BookingError::InvalidPartySize(new.number_of_visiter))?;
        let stmt = format!(
            "INSERT INTO visiters (visit_date, number_of_visiter, user_id, visiting_id) \
             VALUES ($1, $2, $3, $4) RETURNING {};",
            VISITER_COLUMNS
        );
        let row = tx
            .query_one(&stmt, &[&new.visit_date, &count, &new.user_id, &new.visiting_id])
            .await
            .with_context(|| format!("Failed to add visiter for user: {}", new.user_id))?;
        let visiter = parse_row_into_visiter(&row)?;

        tx.commit().await.context("Failed to commit the new visiter")?;
        Ok(visiter)
    }

    async fn cancel(&self, id: VisiterId) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let updated = conn
            .execute(
                "UPDATE visiters SET deleted_at = now(), updated_at = now() \
                 WHERE id = $1 AND deleted_at IS NULL;",
                &[&id],
            )
            .await
            .with_context(|| format!("Failed to cancel visiter with id: {}", id))?;

        Ok(updated > 0)
    }
}

fn visitor_count(row: &Row) -> anyhow::Result<u32> {
    let count: i32 = row.try_get("number_of_visiter")?;
    u32::try_from(count).with_context(|| format!("Negative visitor count in row: {}", count))
}

fn parse_row_into_visiter(
    row: &Row,
) -> anyhow::Result<Visiter> {
    Ok(Visiter {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
        visit_date: row.try_get("visit_date")?,
        number_of_visiter: visitor_count(row)?,
        user_id: row.try_get("user_id")?,
        visiting_id: row.try_get("visiting_id")?,
    })
}
