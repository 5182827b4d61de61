// src/middleware/auth.rs

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{auth::User, rbac::Role},
};

pub const LOGIN_PAGE: &str = "/login";

/// Identidade da requisição, colocada nas extensions pelo `auth_guard`.
/// Todas as checagens de papel/permissão partem daqui.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

// O middleware em si
pub async fn auth_guard(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_parts(&parts);

    let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &app_state).await {
        Ok(TypedHeader(auth)) => auth.token().to_owned(),
        Err(_) => {
            return reject(&parts.headers, &locale, &app_state.i18n_store, AppError::Unauthenticated);
        }
    };

    match app_state.auth_service.authenticate_staff(&token).await {
        Ok(user) => {
            parts.extensions.insert(AuthContext::from(&user));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => reject(&parts.headers, &locale, &app_state.i18n_store, e),
    }
}

/// Sem credencial válida: navegador vai para a tela de login, API recebe 401.
pub fn reject(headers: &HeaderMap, locale: &Locale, store: &I18nStore, error: AppError) -> Response {
    let needs_login = matches!(error, AppError::Unauthenticated | AppError::InvalidToken);

    if needs_login && wants_html(headers) {
        return Redirect::to(LOGIN_PAGE).into_response();
    }

    error.to_api_error(locale, store).into_response()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

// Extrator para obter a identidade diretamente nos handlers
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<I18nStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        current_context(parts, state)
    }
}

/// Lê o `AuthContext` das extensions ou devolve 401 traduzido.
pub fn current_context<S>(parts: &Parts, state: &S) -> Result<AuthContext, ApiError>
where
    Arc<I18nStore>: FromRef<S>,
{
    parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
        let store = Arc::<I18nStore>::from_ref(state);
        let locale = Locale::from_parts(parts);
        AppError::Unauthenticated.to_api_error(&locale, &store)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(accept).unwrap());
        headers
    }

    #[test]
    fn browsers_are_sent_to_login() {
        let store = I18nStore::load().unwrap();
        let response = reject(
            &headers("text/html,application/xhtml+xml"),
            &Locale("en".into()),
            &store,
            AppError::Unauthenticated,
        );

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PAGE);
    }

    #[test]
    fn api_clients_get_401() {
        let store = I18nStore::load().unwrap();
        let response = reject(
            &headers("application/json"),
            &Locale("en".into()),
            &store,
            AppError::InvalidToken,
        );

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn disabled_accounts_are_forbidden_even_in_browsers() {
        let store = I18nStore::load().unwrap();
        let response = reject(&headers("text/html"), &Locale("en".into()), &store, AppError::AccountDisabled);

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
