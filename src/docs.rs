// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Backoffice API", description = "Leads, projetos, clientes, serviços, chamados e portal do cliente"),
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::get_my_permissions,

        // --- Users ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::assign_lead,
        handlers::leads::convert_lead,
        handlers::leads::delete_lead,

        // --- Products ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,

        // --- Projects ---
        handlers::projects::create_project,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::start_project,
        handlers::projects::submit_project,
        handlers::projects::approve_project,
        handlers::projects::reject_project,
        handlers::projects::complete_project,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::set_portal_access,
        handlers::customers::delete_customer,
        handlers::customers::list_customer_services,
        handlers::customers::create_customer_service,

        // --- Services ---
        handlers::services::list_services,
        handlers::services::get_service,
        handlers::services::update_service,
        handlers::services::suspend_service,
        handlers::services::activate_service,
        handlers::services::terminate_service,
        handlers::services::delete_service,

        // --- Tickets ---
        handlers::tickets::create_ticket,
        handlers::tickets::list_tickets,
        handlers::tickets::get_ticket,
        handlers::tickets::assign_ticket,
        handlers::tickets::update_ticket_status,
        handlers::tickets::delete_ticket,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,

        // --- Dashboard ---
        handlers::dashboard::get_summary,

        // --- Portal ---
        handlers::portal::login,
        handlers::portal::logout,
        handlers::portal::dashboard,
        handlers::portal::services,
        handlers::portal::billing,
        handlers::portal::invoice_pdf,
        handlers::portal::list_tickets,
        handlers::portal::create_ticket,
        handlers::portal::get_ticket,
    ),
    components(
        schemas(
            // --- Auth / RBAC ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::RolePermissionsResponse,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::Lead,
            models::lead::LeadWithAssignee,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadPayload,
            models::lead::AssignLeadPayload,
            models::lead::ConvertLeadPayload,

            // --- Products ---
            models::product::BillingCycle,
            models::product::Product,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,

            // --- Projects ---
            models::project::ProjectStatus,
            models::project::Project,
            models::project::ProjectDetail,
            models::project::CreateProjectPayload,
            models::project::UpdateProjectPayload,
            models::project::RejectProjectPayload,

            // --- Customers / Services ---
            models::customer::Customer,
            models::customer::CustomerDetail,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,
            models::customer::PortalAccessPayload,
            models::customer::ServiceStatus,
            models::customer::CustomerService,
            models::customer::CustomerServiceDetail,
            models::customer::CreateCustomerServicePayload,
            models::customer::UpdateCustomerServicePayload,

            // --- Tickets ---
            models::ticket::TicketStatus,
            models::ticket::TicketPriority,
            models::ticket::TicketCategory,
            models::ticket::SupportTicket,
            models::ticket::TicketDetail,
            models::ticket::CreateTicketPayload,
            models::ticket::UpdateTicketStatusPayload,
            models::ticket::AssignTicketPayload,

            // --- Notifications ---
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::UnreadCount,

            // --- Dashboard ---
            models::dashboard::LeadStatusCount,
            models::dashboard::DashboardSummary,

            // --- Portal ---
            models::portal::PortalLoginPayload,
            models::portal::PortalAuthResponse,
            models::portal::PortalDashboard,
            models::portal::BillingLine,
            models::portal::BillingSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Login da equipe e identidade atual"),
        (name = "Users", description = "Gestão de usuários (admin)"),
        (name = "Leads", description = "Funil comercial"),
        (name = "Products", description = "Catálogo de planos"),
        (name = "Projects", description = "Projetos e fluxo de aprovação"),
        (name = "Customers", description = "Clientes"),
        (name = "Services", description = "Serviços contratados"),
        (name = "Tickets", description = "Chamados de suporte"),
        (name = "Notifications", description = "Notificações in-app"),
        (name = "Dashboard", description = "Indicadores da operação"),
        (name = "Portal", description = "Portal do cliente"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_approval_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/projects/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/portal/services/{id}/invoice.pdf"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
