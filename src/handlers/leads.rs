// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::{PageRequest, Paginated},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{
            PermLeadsAssign, PermLeadsConvert, PermLeadsCreate, PermLeadsDelete, PermLeadsEdit, PermLeadsView,
            RequirePermission,
        },
    },
    models::{
        customer::Customer,
        lead::{
            AssignLeadPayload, ConvertLeadPayload, CreateLeadPayload, Lead, LeadFilter, LeadWithAssignee,
            UpdateLeadPayload,
        },
    },
};

// POST /api/v1/leads
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermLeadsCreate>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_lead(&payload, gate.ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/v1/leads
#[utoipa::path(
    get,
    path = "/api/v1/leads",
    tag = "Leads",
    params(LeadFilter),
    responses((status = 200, description = "Leads paginados", body = Paginated<LeadWithAssignee>)),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsView>,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (leads, total) = app_state
        .lead_service
        .list_leads(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(leads, page, total))))
}

// GET /api/v1/leads/{id}
#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead com responsável", body = LeadWithAssignee),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .get_lead(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// PUT /api/v1/leads/{id}
#[utoipa::path(
    put,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_lead(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// POST /api/v1/leads/{id}/assign
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/assign",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = AssignLeadPayload,
    responses(
        (status = 200, description = "Lead atribuído", body = Lead),
        (status = 404, description = "Lead ou usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsAssign>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .lead_service
        .assign_lead(id, payload.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// POST /api/v1/leads/{id}/convert
#[utoipa::path(
    post,
    path = "/api/v1/leads/{id}/convert",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = ConvertLeadPayload,
    responses(
        (status = 201, description = "Cliente criado a partir do lead", body = Customer),
        (status = 409, description = "Lead já convertido"),
        (status = 422, description = "Lead não está em closed_won")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsConvert>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .lead_service
        .convert_lead(id, payload.portal_password.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// DELETE /api/v1/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Lead com projetos ou cliente vinculados")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermLeadsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lead_service
        .delete_lead(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
