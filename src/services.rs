pub mod auth;
pub mod crm_service;
pub mod dashboard_service;
pub mod document_service;
pub mod lead_service;
pub mod notification_service;
pub mod portal_service;
pub mod product_service;
pub mod project_service;
pub mod ticket_service;
pub mod user_service;
