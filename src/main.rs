//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::middleware::{auth::auth_guard, portal::portal_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some((email, password)) = &config.bootstrap_admin {
        app_state
            .user_service
            .ensure_bootstrap_admin(email, password)
            .await
            .context("Falha ao criar o administrador inicial")?;
    }

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Identidade atual (protegida)
    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/permissions", get(handlers::auth::get_my_permissions));

    let user_routes = Router::new()
        .route("/", post(handlers::users::create_user).get(handlers::users::list_users))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let lead_routes = Router::new()
        .route("/", post(handlers::leads::create_lead).get(handlers::leads::list_leads))
        .route(
            "/{id}",
            get(handlers::leads::get_lead)
                .put(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route("/{id}/assign", post(handlers::leads::assign_lead))
        .route("/{id}/convert", post(handlers::leads::convert_lead));

    let product_routes = Router::new()
        .route("/", post(handlers::products::create_product).get(handlers::products::list_products))
        .route(
            "/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        );

    let project_routes = Router::new()
        .route("/", post(handlers::projects::create_project).get(handlers::projects::list_projects))
        .route(
            "/{id}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        // Fluxo de aprovação
        .route("/{id}/start", post(handlers::projects::start_project))
        .route("/{id}/submit", post(handlers::projects::submit_project))
        .route("/{id}/approve", post(handlers::projects::approve_project))
        .route("/{id}/reject", post(handlers::projects::reject_project))
        .route("/{id}/complete", post(handlers::projects::complete_project));

    let customer_routes = Router::new()
        .route("/", post(handlers::customers::create_customer).get(handlers::customers::list_customers))
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/{id}/portal-access", put(handlers::customers::set_portal_access))
        .route(
            "/{id}/services",
            post(handlers::customers::create_customer_service).get(handlers::customers::list_customer_services),
        );

    let service_routes = Router::new()
        .route("/", get(handlers::services::list_services))
        .route(
            "/{id}",
            get(handlers::services::get_service)
                .put(handlers::services::update_service)
                .delete(handlers::services::delete_service),
        )
        .route("/{id}/suspend", post(handlers::services::suspend_service))
        .route("/{id}/activate", post(handlers::services::activate_service))
        .route("/{id}/terminate", post(handlers::services::terminate_service));

    let ticket_routes = Router::new()
        .route("/", post(handlers::tickets::create_ticket).get(handlers::tickets::list_tickets))
        .route("/{id}", get(handlers::tickets::get_ticket).delete(handlers::tickets::delete_ticket))
        .route("/{id}/assign", post(handlers::tickets::assign_ticket))
        .route("/{id}/status", put(handlers::tickets::update_ticket_status));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route("/{id}/read", post(handlers::notifications::mark_read));

    let dashboard_routes = Router::new().route("/summary", get(handlers::dashboard::get_summary));

    // Tudo que exige token da equipe
    let staff_api = Router::new()
        .nest("/auth", me_routes)
        .nest("/users", user_routes)
        .nest("/leads", lead_routes)
        .nest("/products", product_routes)
        .nest("/projects", project_routes)
        .nest("/customers", customer_routes)
        .nest("/services", service_routes)
        .nest("/tickets", ticket_routes)
        .nest("/notifications", notification_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Portal do cliente: login/logout públicos, o resto exige sessão do portal
    let portal_session_routes = Router::new()
        .route("/dashboard", get(handlers::portal::dashboard))
        .route("/services", get(handlers::portal::services))
        .route("/services/{id}/invoice.pdf", get(handlers::portal::invoice_pdf))
        .route("/billing", get(handlers::portal::billing))
        .route("/tickets", get(handlers::portal::list_tickets).post(handlers::portal::create_ticket))
        .route("/tickets/{id}", get(handlers::portal::get_ticket))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            portal_guard,
        ));

    let portal_routes = Router::new()
        .route("/login", post(handlers::portal::login))
        .route("/logout", post(handlers::portal::logout))
        .merge(portal_session_routes);

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", staff_api)
        .nest("/api/portal", portal_routes)
        .with_state(app_state)
}
