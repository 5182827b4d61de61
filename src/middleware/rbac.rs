// src/middleware/rbac.rs

use std::{marker::PhantomData, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    middleware::{
        auth::{current_context, AuthContext},
        i18n::Locale,
    },
    models::rbac::Permission,
};

/// 1. O Trait que define o que é uma Permissão exigida por um handler
pub trait PermissionDef: Send + Sync + 'static {
    const PERMISSION: Permission;
}

/// Lista de papéis separados por vírgula ("manager,admin"); basta um ser satisfeito
pub trait RoleSetDef: Send + Sync + 'static {
    const ROLES: &'static str;
}

/// 2. O Extractor (Guardião). Dá acesso à identidade já verificada.
pub struct RequirePermission<T> {
    pub ctx: AuthContext,
    _perm: PhantomData<T>,
}

pub struct RequireRole<T> {
    pub ctx: AuthContext,
    _roles: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    Arc<I18nStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = current_context(parts, state)?;

        if !ctx.role.has_permission(T::PERMISSION) {
            tracing::warn!("🚫 {} ({}) sem a permissão {}", ctx.email, ctx.role, T::PERMISSION);
            let store = Arc::<I18nStore>::from_ref(state);
            return Err(AppError::MissingPermission(T::PERMISSION).to_api_error(&Locale::from_parts(parts), &store));
        }

        Ok(RequirePermission { ctx, _perm: PhantomData })
    }
}

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSetDef,
    S: Send + Sync,
    Arc<I18nStore>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = current_context(parts, state)?;

        if !ctx.role.satisfies_any(T::ROLES) {
            tracing::warn!("🚫 {} ({}) fora dos papéis {}", ctx.email, ctx.role, T::ROLES);
            let store = Arc::<I18nStore>::from_ref(state);
            return Err(AppError::MissingRole(T::ROLES.to_string()).to_api_error(&Locale::from_parts(parts), &store));
        }

        Ok(RequireRole { ctx, _roles: PhantomData })
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_markers {
    ($($marker:ident => $perm:ident),* $(,)?) => {
        $(
            pub struct $marker;
            impl PermissionDef for $marker {
                const PERMISSION: Permission = Permission::$perm;
            }
        )*
    };
}

permission_markers! {
    PermLeadsView => LeadsView,
    PermLeadsCreate => LeadsCreate,
    PermLeadsEdit => LeadsEdit,
    PermLeadsAssign => LeadsAssign,
    PermLeadsConvert => LeadsConvert,
    PermLeadsDelete => LeadsDelete,
    PermProductsView => ProductsView,
    PermProductsCreate => ProductsCreate,
    PermProductsEdit => ProductsEdit,
    PermProductsDelete => ProductsDelete,
    PermProjectsView => ProjectsView,
    PermProjectsCreate => ProjectsCreate,
    PermProjectsEdit => ProjectsEdit,
    PermProjectsSubmit => ProjectsSubmit,
    PermProjectsApprove => ProjectsApprove,
    PermProjectsComplete => ProjectsComplete,
    PermProjectsDelete => ProjectsDelete,
    PermCustomersView => CustomersView,
    PermCustomersCreate => CustomersCreate,
    PermCustomersEdit => CustomersEdit,
    PermCustomersDelete => CustomersDelete,
    PermServicesView => ServicesView,
    PermServicesCreate => ServicesCreate,
    PermServicesEdit => ServicesEdit,
    PermServicesDelete => ServicesDelete,
    PermTicketsView => TicketsView,
    PermTicketsEdit => TicketsEdit,
    PermTicketsDelete => TicketsDelete,
    PermUsersView => UsersView,
    PermUsersCreate => UsersCreate,
    PermUsersEdit => UsersEdit,
    PermUsersDelete => UsersDelete,
    PermReportsView => ReportsView,
}

pub struct ManagerOrAdmin;
impl RoleSetDef for ManagerOrAdmin {
    const ROLES: &'static str = "manager,admin";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::Role;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn approve(_gate: RequireRole<ManagerOrAdmin>) -> &'static str {
        "ok"
    }

    async fn edit_lead(_gate: RequirePermission<PermLeadsEdit>) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        let store = Arc::new(I18nStore::load().unwrap());
        Router::new()
            .route("/projects/{id}/approve", post(approve))
            .route("/leads/{id}", post(edit_lead))
            .with_state(store)
    }

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            name: "Teste".into(),
            email: "teste@provedor.net".into(),
            role,
        }
    }

    fn request(uri: &str, ctx: Option<AuthContext>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ctx) = ctx {
            builder = builder.extension(ctx);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn sales_cannot_approve_projects() {
        let uri = format!("/projects/{}/approve", Uuid::new_v4());
        let response = app().oneshot(request(&uri, Some(ctx(Role::Sales)))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn managers_and_admins_pass_the_approval_gate() {
        let uri = format!("/projects/{}/approve", Uuid::new_v4());
        for role in [Role::Manager, Role::Admin] {
            let response = app().oneshot(request(&uri, Some(ctx(role)))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{role}");
        }
    }

    #[tokio::test]
    async fn permission_gate_follows_the_role_table() {
        let uri = format!("/leads/{}", Uuid::new_v4());

        let sales = app().oneshot(request(&uri, Some(ctx(Role::Sales)))).await.unwrap();
        assert_eq!(sales.status(), StatusCode::OK);

        let support = app().oneshot(request(&uri, Some(ctx(Role::Support)))).await.unwrap();
        assert_eq!(support.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let uri = format!("/projects/{}/approve", Uuid::new_v4());
        let response = app().oneshot(request(&uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
