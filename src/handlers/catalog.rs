use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::Service;
use crate::state::AppState;

// GET /api/professionals/:id/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(professional_id): Path<String>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = {
        let db = state.conn();
        queries::get_services_for_professional(&db, &professional_id)?
    };
    Ok(Json(services))
}

// POST /api/professionals/:id/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: u32,
    pub price: Decimal,
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(professional_id): Path<String>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("service name is required".to_string()));
    }
    if body.price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        professional_id,
        name: name.to_string(),
        duration_minutes: body.duration_minutes,
        price: body.price,
        created_at: Utc::now().trunc_subsecs(0),
    };

    {
        let db = state.conn();
        queries::create_service(&db, &service)?;
    }
    tracing::info!(service_id = %service.id, professional_id = %service.professional_id, "service added");

    Ok((StatusCode::CREATED, Json(service)))
}
