// src/handlers/tickets.rs

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
        rbac::{PermTicketsDelete, PermTicketsEdit, PermTicketsView, RequirePermission},
    },
    models::ticket::{
        AssignTicketPayload, CreateTicketPayload, SupportTicket, TicketDetail, TicketFilter,
        UpdateTicketStatusPayload,
    },
};

// POST /api/v1/tickets
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "Tickets",
    request_body = CreateTicketPayload,
    responses(
        (status = 201, description = "Chamado aberto em nome do cliente", body = SupportTicket),
        (status = 404, description = "Cliente ou serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsEdit>,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    // Pela equipe, o cliente precisa vir no payload
    let customer_id = payload
        .customer_id
        .ok_or_else(|| AppError::NotFound("customer").to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .open_ticket(customer_id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

// GET /api/v1/tickets
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    params(TicketFilter),
    responses((status = 200, description = "Chamados paginados", body = Paginated<TicketDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsView>,
    Query(filter): Query<TicketFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (tickets, total) = app_state
        .ticket_service
        .list_tickets(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(tickets, page, total))))
}

// GET /api/v1/tickets/{id}
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado com cliente e responsável", body = TicketDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .ticket_service
        .get_ticket(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// POST /api/v1/tickets/{id}/assign
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/assign",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = AssignTicketPayload,
    responses(
        (status = 200, description = "Chamado atribuído", body = SupportTicket),
        (status = 404, description = "Chamado ou usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .ticket_service
        .assign_ticket(id, payload.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// PUT /api/v1/tickets/{id}/status
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}/status",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    request_body = UpdateTicketStatusPayload,
    responses(
        (status = 200, description = "Status (e prioridade) atualizados", body = SupportTicket),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ticket_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .ticket_service
        .update_status(id, payload.status, payload.priority)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

// DELETE /api/v1/tickets/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermTicketsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .ticket_service
        .delete_ticket(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
