pub mod user_repo;
pub use user_repo::UserRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
