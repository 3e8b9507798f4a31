use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::serde_as;
use time::Date;
use tracing::info;
use crate::controller::AppState;
use crate::errors::BookingError;
use crate::models::visit_day::VisitDay;
use crate::models::visiter::{Availability, NewVisiter, VisiterId};
use crate::repositories::VisiterRepo;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/visiters", get(get_all_visiters).post(add_visiter))
        .route("/visiters/:id", get(get_visiter).delete(cancel_visiter))
        .route("/availability", get(get_availability))
        .route_layer(Extension(app_state.visiter_repo))
}

pub async fn get_all_visiters(
    Extension(visiter_repo): Extension<Arc<dyn VisiterRepo>>,
) -> Result<impl IntoResponse, BookingError> {
    let visiters = visiter_repo.list().await?;
    Ok(Json(json!({ "data": visiters })))
}

pub async fn get_visiter(
    Extension(visiter_repo): Extension<Arc<dyn VisiterRepo>>,
    id: Result<Path<VisiterId>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Path(id) = id?;
    match visiter_repo.get(id).await? {
        Some(visiter) => Ok(Json(json!({ "data": visiter }))),
        None => Err(BookingError::NotFound(id)),
    }
}

pub async fn add_visiter(
    Extension(visiter_repo): Extension<Arc<dyn VisiterRepo>>,
    body: Result<Json<NewVisiter>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Json(body) = body?;
    if body.number_of_visiter == 0 {
        return Err(BookingError::InvalidPartySize(0));
    }

    let visiter = visiter_repo.insert_within_capacity(body).await?;
    info!(
        "Booked {} visitors on {} as reservation {}",
        visiter.number_of_visiter, visiter.visit_date, visiter.id
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": visiter }))))
}

pub async fn cancel_visiter(
    Extension(visiter_repo): Extension<Arc<dyn VisiterRepo>>,
    id: Result<Path<VisiterId>, PathRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Path(id) = id?;
    if !visiter_repo.cancel(id).await? {
        return Err(BookingError::NotFound(id));
    }

    info!("Cancelled reservation {}", id);
    Ok(Json(json!({ "message": "Successfully cancelled reservation" })))
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AvailabilityQuery {
    #[serde_as(as = "VisitDay")]
    pub date: Date,
}

pub async fn get_availability(
    Extension(visiter_repo): Extension<Arc<dyn VisiterRepo>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Query(query) = query?;
    let visiters = visiter_repo.list_for_date(query.date).await?;
    Ok(Json(json!({ "data": Availability::for_day(&visiters, query.date) })))
}
