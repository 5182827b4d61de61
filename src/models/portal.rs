// src/models/portal.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{
    customer::{Customer, CustomerServiceDetail, ServiceStatus},
    product::BillingCycle,
    ticket::SupportTicket,
};

// Login do cliente: pelo código de cliente ou pelo e-mail
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PortalLoginPayload {
    #[validate(length(min = 3, message = "required"))]
    #[schema(example = "CUST-20261016-001")]
    pub login: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// O token também vai no cookie portal_session
#[derive(Debug, Serialize, ToSchema)]
pub struct PortalAuthResponse {
    pub token: String,
    pub customer: Customer,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalDashboard {
    pub customer: Customer,
    pub active_services: usize,
    pub suspended_services: usize,
    pub open_tickets: i64,
    pub monthly_total: Decimal,
    pub recent_tickets: Vec<SupportTicket>,
}

// Uma linha da fatura: serviço + valor mensal equivalente
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingLine {
    pub service_number: String,
    pub product_name: String,
    pub billing_cycle: BillingCycle,
    pub status: ServiceStatus,
    pub fee: Decimal,
    pub monthly_equivalent: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub customer_code: String,
    pub lines: Vec<BillingLine>,
    pub monthly_total: Decimal,
}

impl BillingSummary {
    /// Monta o resumo: só serviços ativos entram no total recorrente.
    pub fn from_services(customer_code: String, services: &[CustomerServiceDetail]) -> Self {
        let lines: Vec<BillingLine> = services
            .iter()
            .filter(|s| s.service.status != ServiceStatus::Terminated)
            .map(|s| BillingLine {
                service_number: s.service.service_number.clone(),
                product_name: s.product_name.clone(),
                billing_cycle: s.billing_cycle,
                status: s.service.status,
                fee: s.service.monthly_fee,
                monthly_equivalent: s.billing_cycle.monthly_equivalent(s.service.monthly_fee),
            })
            .collect();

        let monthly_total = lines
            .iter()
            .filter(|l| l.status == ServiceStatus::Active)
            .map(|l| l.monthly_equivalent)
            .sum();

        Self { customer_code, lines, monthly_total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customer::CustomerService;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn service(number: &str, status: ServiceStatus, fee: &str, cycle: BillingCycle) -> CustomerServiceDetail {
        CustomerServiceDetail {
            service: CustomerService {
                id: Uuid::new_v4(),
                service_number: number.to_string(),
                customer_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                status,
                monthly_fee: Decimal::from_str(fee).unwrap(),
                start_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                end_date: None,
                installation_address: None,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            product_name: "Fibra".into(),
            product_code: "FIBRA".into(),
            billing_cycle: cycle,
            bandwidth_mbps: Some(300),
        }
    }

    #[test]
    fn billing_counts_only_active_services() {
        let services = vec![
            service("SVC-202610-0001", ServiceStatus::Active, "99.90", BillingCycle::Monthly),
            service("SVC-202610-0002", ServiceStatus::Active, "300.00", BillingCycle::Quarterly),
            service("SVC-202610-0003", ServiceStatus::Suspended, "50.00", BillingCycle::Monthly),
            service("SVC-202610-0004", ServiceStatus::Terminated, "80.00", BillingCycle::Monthly),
        ];

        let summary = BillingSummary::from_services("CUST-20261016-001".into(), &services);

        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.monthly_total, Decimal::from_str("199.90").unwrap());
    }
}
