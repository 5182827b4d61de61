// src/middleware/portal.rs

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::customer::Customer,
};

pub const PORTAL_COOKIE: &str = "portal_session";

/// Cliente autenticado no portal (nunca um usuário da equipe).
#[derive(Debug, Clone)]
pub struct PortalCustomer(pub Customer);

// Aceita o token no Authorization ou no cookie da sessão do portal
pub async fn portal_guard(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_parts(&parts);

    let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &app_state)
        .await
        .ok()
        .map(|TypedHeader(auth)| auth.token().to_owned());

    let token = bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(PORTAL_COOKIE)
            .map(|cookie| cookie.value().to_owned())
    });

    let Some(token) = token else {
        return AppError::Unauthenticated
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response();
    };

    match app_state.auth_service.authenticate_customer(&token).await {
        Ok(customer) => {
            parts.extensions.insert(PortalCustomer(customer));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.to_api_error(&locale, &app_state.i18n_store).into_response(),
    }
}

impl<S> FromRequestParts<S> for PortalCustomer
where
    S: Send + Sync,
    Arc<I18nStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<PortalCustomer>().cloned().ok_or_else(|| {
            let store = Arc::<I18nStore>::from_ref(state);
            let locale = Locale::from_parts(parts);
            AppError::Unauthenticated.to_api_error(&locale, &store)
        })
    }
}
