// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::product::BillingCycle;

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "CUST-20261016-001")]
    pub customer_code: String,
    pub lead_id: Option<Uuid>,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub portal_password_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn has_portal_access(&self) -> bool {
        self.portal_password_hash.is_some()
    }
}

// Cliente com os serviços já carregados
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub portal_access: bool,
    pub services: Vec<CustomerServiceDetail>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: String,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub portal_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: Option<String>,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalAccessPayload {
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Busca por código, nome, empresa ou e-mail
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// --- SERVIÇO CONTRATADO ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Active,
    Suspended,
    Terminated,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Suspended => "suspended",
            ServiceStatus::Terminated => "terminated",
        }
    }

    /// Estados a partir dos quais se pode chegar em `target`.
    /// Cancelado é definitivo.
    pub fn can_become(self, target: ServiceStatus) -> bool {
        matches!(
            (self, target),
            (ServiceStatus::Active, ServiceStatus::Suspended)
                | (ServiceStatus::Suspended, ServiceStatus::Active)
                | (ServiceStatus::Active | ServiceStatus::Suspended, ServiceStatus::Terminated)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerService {
    pub id: Uuid,
    #[schema(example = "SVC-202610-0001")]
    pub service_number: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub status: ServiceStatus,
    #[schema(example = "99.90")]
    pub monthly_fee: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub installation_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Serviço + dados do produto (JOIN com products)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerServiceDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub service: CustomerService,
    pub product_name: String,
    pub product_code: String,
    pub billing_cycle: BillingCycle,
    pub bandwidth_mbps: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerServicePayload {
    pub product_id: Uuid,
    // Se não vier, usa o preço do produto
    pub monthly_fee: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date, example = "2026-10-16")]
    pub start_date: Option<NaiveDate>,
    pub installation_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerServicePayload {
    pub monthly_fee: Option<Decimal>,
    pub installation_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerServiceFilter {
    pub status: Option<ServiceStatus>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    /// Busca pelo número do serviço
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_is_final() {
        for target in [ServiceStatus::Active, ServiceStatus::Suspended, ServiceStatus::Terminated] {
            assert!(!ServiceStatus::Terminated.can_become(target));
        }
    }

    #[test]
    fn suspend_and_reactivate() {
        assert!(ServiceStatus::Active.can_become(ServiceStatus::Suspended));
        assert!(ServiceStatus::Suspended.can_become(ServiceStatus::Active));
        assert!(!ServiceStatus::Active.can_become(ServiceStatus::Active));
        assert!(ServiceStatus::Suspended.can_become(ServiceStatus::Terminated));
    }
}
