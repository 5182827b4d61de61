// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CustomerRepository, DashboardRepository, LeadRepository, NotificationRepository, ProductRepository,
        ProjectRepository, SequenceRepository, TicketRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        crm_service::CrmService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        lead_service::LeadService,
        notification_service::{
            InAppSink, MailLogSink, NotificationDispatcher, NotificationService, NotificationSink, RetryPolicy,
        },
        portal_service::PortalService,
        product_service::ProductService,
        project_service::ProjectService,
        ticket_service::TicketService,
        user_service::UserService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub notify_queue_size: usize,
    pub notify_max_attempts: u32,
    pub fonts_dir: PathBuf,
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bootstrap_admin = match (env::var("BOOTSTRAP_ADMIN_EMAIL"), env::var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email.trim().to_string(), password))
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            notify_queue_size: parse_or("NOTIFY_QUEUE_SIZE", 256)?,
            notify_max_attempts: parse_or("NOTIFY_MAX_ATTEMPTS", 3)?,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()).into(),
            bootstrap_admin,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ('{}'): {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub lead_service: LeadService,
    pub product_service: ProductService,
    pub project_service: ProjectService,
    pub crm_service: CrmService,
    pub ticket_service: TicketService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
    pub portal_service: PortalService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let project_repo = ProjectRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let ticket_repo = TicketRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let sequence_repo = SequenceRepository::new();

        let sinks: Vec<Arc<dyn NotificationSink>> = vec![
            Arc::new(InAppSink::new(notification_repo.clone())),
            Arc::new(MailLogSink),
        ];
        let notifier = NotificationDispatcher::spawn(
            sinks,
            RetryPolicy::new(config.notify_max_attempts),
            config.notify_queue_size,
        );

        Ok(Self {
            auth_service: AuthService::new(user_repo.clone(), customer_repo.clone(), config.jwt_secret.clone()),
            user_service: UserService::new(user_repo.clone()),
            lead_service: LeadService::new(
                db_pool.clone(),
                lead_repo.clone(),
                user_repo.clone(),
                customer_repo.clone(),
                sequence_repo.clone(),
            ),
            product_service: ProductService::new(product_repo.clone()),
            project_service: ProjectService::new(
                db_pool.clone(),
                project_repo,
                lead_repo,
                product_repo.clone(),
                user_repo.clone(),
                notifier,
            ),
            crm_service: CrmService::new(db_pool.clone(), customer_repo.clone(), product_repo, sequence_repo.clone()),
            ticket_service: TicketService::new(
                db_pool.clone(),
                ticket_repo.clone(),
                customer_repo.clone(),
                user_repo,
                sequence_repo,
            ),
            notification_service: NotificationService::new(notification_repo),
            dashboard_service: DashboardService::new(DashboardRepository::new()),
            portal_service: PortalService::new(customer_repo, ticket_repo),
            document_service: DocumentService::new(config.fonts_dir.clone()),
            i18n_store,
            db_pool,
        })
    }
}

// Permite que extratores peçam só o catálogo de mensagens
impl FromRef<AppState> for Arc<I18nStore> {
    fn from_ref(state: &AppState) -> Self {
        state.i18n_store.clone()
    }
}
