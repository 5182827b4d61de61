// src/services/portal_service.rs

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::{CustomerRepository, TicketRepository},
    models::{
        customer::{Customer, ServiceStatus},
        portal::{BillingSummary, PortalDashboard},
        ticket::TicketFilter,
    },
};

const RECENT_TICKETS: i64 = 5;

// Leituras do portal, sempre presas ao cliente autenticado
#[derive(Clone)]
pub struct PortalService {
    customer_repo: CustomerRepository,
    ticket_repo: TicketRepository,
}

impl PortalService {
    pub fn new(customer_repo: CustomerRepository, ticket_repo: TicketRepository) -> Self {
        Self { customer_repo, ticket_repo }
    }

    pub async fn dashboard(&self, customer: Customer) -> Result<PortalDashboard, AppError> {
        let services = self.customer_repo.list_services_of(customer.id).await?;
        let open_tickets = self.ticket_repo.count_open_for_customer(customer.id).await?;

        let filter = TicketFilter { customer_id: Some(customer.id), ..Default::default() };
        let (recent, _) = self
            .ticket_repo
            .list_tickets(&filter, PageRequest::new(Some(1), Some(RECENT_TICKETS)))
            .await?;

        let billing = BillingSummary::from_services(customer.customer_code.clone(), &services);
        let count = |status: ServiceStatus| services.iter().filter(|s| s.service.status == status).count();

        Ok(PortalDashboard {
            active_services: count(ServiceStatus::Active),
            suspended_services: count(ServiceStatus::Suspended),
            open_tickets,
            monthly_total: billing.monthly_total,
            recent_tickets: recent.into_iter().map(|t| t.ticket).collect(),
            customer,
        })
    }

    pub async fn billing(&self, customer: &Customer) -> Result<BillingSummary, AppError> {
        let services = self.customer_repo.list_services_of(customer.id).await?;
        Ok(BillingSummary::from_services(customer.customer_code.clone(), &services))
    }
}
