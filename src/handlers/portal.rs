// src/handlers/portal.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
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
        portal::{PortalCustomer, PORTAL_COOKIE},
    },
    models::{
        customer::CustomerServiceDetail,
        portal::{BillingSummary, PortalAuthResponse, PortalDashboard, PortalLoginPayload},
        ticket::{CreateTicketPayload, SupportTicket, TicketDetail, TicketFilter},
    },
};

const COOKIE_PATH: &str = "/api/portal";

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((PORTAL_COOKIE, token))
        .path(COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// POST /api/portal/login
#[utoipa::path(
    post,
    path = "/api/portal/login",
    tag = "Portal",
    request_body = PortalLoginPayload,
    responses(
        (status = 200, description = "Token do portal (também no cookie portal_session)", body = PortalAuthResponse),
        (status = 401, description = "Credenciais inválidas ou cliente sem acesso ao portal")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<PortalLoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (token, customer) = app_state
        .auth_service
        .login_customer(&payload.login, &payload.password)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(PortalAuthResponse { token, customer })))
}

// POST /api/portal/logout
#[utoipa::path(
    post,
    path = "/api/portal/logout",
    tag = "Portal",
    responses((status = 204, description = "Cookie da sessão removido"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(Cookie::build(PORTAL_COOKIE).path(COOKIE_PATH)), StatusCode::NO_CONTENT)
}

// GET /api/portal/dashboard
#[utoipa::path(
    get,
    path = "/api/portal/dashboard",
    tag = "Portal",
    responses(
        (status = 200, description = "Resumo do cliente", body = PortalDashboard),
        (status = 401, description = "Sessão do portal ausente ou inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .portal_service
        .dashboard(customer)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/portal/services
#[utoipa::path(
    get,
    path = "/api/portal/services",
    tag = "Portal",
    responses((status = 200, description = "Serviços contratados", body = Vec<CustomerServiceDetail>)),
    security(("api_jwt" = []))
)]
pub async fn services(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .crm_service
        .services_of(customer.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

// GET /api/portal/billing
#[utoipa::path(
    get,
    path = "/api/portal/billing",
    tag = "Portal",
    responses((status = 200, description = "Valor mensal equivalente de cada serviço", body = BillingSummary)),
    security(("api_jwt" = []))
)]
pub async fn billing(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .portal_service
        .billing(&customer)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/portal/services/{id}/invoice.pdf
#[utoipa::path(
    get,
    path = "/api/portal/services/{id}/invoice.pdf",
    tag = "Portal",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Fatura do mês corrente (application/pdf)"),
        (status = 404, description = "Serviço não pertence ao cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let service = app_state
        .crm_service
        .get_service(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Serviço de outro cliente responde como inexistente
    if service.service.customer_id != customer.id {
        return Err(AppError::NotFound("service").to_api_error(&locale, &app_state.i18n_store));
    }

    let pdf_bytes = app_state
        .document_service
        .invoice_pdf(&customer, &service, Utc::now().date_naive())
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"fatura_{}.pdf\"", service.service.service_number),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}

// GET /api/portal/tickets
#[utoipa::path(
    get,
    path = "/api/portal/tickets",
    tag = "Portal",
    params(TicketFilter),
    responses((status = 200, description = "Chamados do cliente", body = Paginated<TicketDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
    Query(filter): Query<TicketFilter>,
) -> Result<impl IntoResponse, ApiError> {
    // O cliente só enxerga os próprios chamados, seja qual for o filtro
    let filter = TicketFilter { customer_id: Some(customer.id), assigned_to: None, ..filter };
    let page = PageRequest::new(filter.page, filter.per_page);

    let (tickets, total) = app_state
        .ticket_service
        .list_tickets(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(tickets, page, total))))
}

// POST /api/portal/tickets
#[utoipa::path(
    post,
    path = "/api/portal/tickets",
    tag = "Portal",
    request_body = CreateTicketPayload,
    responses(
        (status = 201, description = "Chamado aberto", body = SupportTicket),
        (status = 404, description = "Serviço não pertence ao cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ticket = app_state
        .ticket_service
        .open_ticket(customer.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

// GET /api/portal/tickets/{id}
#[utoipa::path(
    get,
    path = "/api/portal/tickets/{id}",
    tag = "Portal",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado do cliente", body = TicketDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    PortalCustomer(customer): PortalCustomer,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = app_state
        .ticket_service
        .get_customer_ticket(customer.id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ticket)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_scoped_to_the_portal() {
        let cookie = session_cookie("abc".into());
        assert_eq!(cookie.name(), PORTAL_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some(COOKIE_PATH));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
