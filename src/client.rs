//! Typed HTTP client for the visit service.

use anyhow::{anyhow, Context};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use time::Date;
use tracing::debug;
use crate::models::visiter::{Availability, NewVisiter, Visiter, VisiterId};

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
    error: Option<String>,
}

/// Error answer from the service, with its status kept so callers can tell
/// a full day from a missing reservation.
#[derive(Debug, thiserror::Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Clone)]
pub struct VisitClient {
    http: Client,
    base_url: String,
}

impl VisitClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn list_visiters(&self) -> anyhow::Result<Vec<Visiter>> {
        let response = self
            .http
            .get(format!("{}/visiters", self.base_url))
            .send()
            .await
            .context("Failed to fetch visiters")?;
        read_data(response).await
    }

    pub async fn get_visiter(&self, id: VisiterId) -> anyhow::Result<Visiter> {
        let response = self
            .http
            .get(format!("{}/visiters/{}", self.base_url, id))
            .send()
            .await
            .with_context(|| format!("Failed to fetch visiter {}", id))?;
        read_data(response).await
    }

    pub async fn create_visiter(&self, new: &NewVisiter) -> anyhow::Result<Visiter> {
        debug!("Submitting {} visitors for {}", new.number_of_visiter, new.visit_date);
        let response = self
            .http
            .post(format!("{}/visiters", self.base_url))
            .json(new)
            .send()
            .await
            .context("Failed to submit visiter")?;
        read_data(response).await
    }

    pub async fn cancel_visiter(&self, id: VisiterId) -> anyhow::Result<()> {
        let response = self
            .http
            .delete(format!("{}/visiters/{}", self.base_url, id))
            .send()
            .await
            .with_context(|| format!("Failed to cancel visiter {}", id))?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn availability(&self, date: Date) -> anyhow::Result<Availability> {
        let response = self
            .http
            .get(format!("{}/availability", self.base_url))
            .query(&[("date", date.to_string())])
            .send()
            .await
            .with_context(|| format!("Failed to fetch availability for {}", date))?;
        read_data(response).await
    }
}

async fn check_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<MessageBody>()
        .await
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
    Err(anyhow!(ApiError { status, message }))
}

async fn read_data<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let response = check_status(response).await?;
    let envelope = response
        .json::<DataEnvelope<T>>()
        .await
        .context("Malformed response from visit service")?;
    Ok(envelope.data)
}
