// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "billing_cycle", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

impl BillingCycle {
    /// Quantos meses um ciclo cobre. Cobrança avulsa não recorre.
    pub fn months(self) -> Option<u32> {
        match self {
            BillingCycle::Monthly => Some(1),
            BillingCycle::Quarterly => Some(3),
            BillingCycle::Yearly => Some(12),
            BillingCycle::OneTime => None,
        }
    }

    /// Valor mensal equivalente de uma cobrança deste ciclo (2 casas).
    pub fn monthly_equivalent(self, amount: Decimal) -> Decimal {
        match self.months() {
            Some(months) => (amount / Decimal::from(months)).round_dp(2),
            None => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "FIBRA-300")]
    pub code: String,
    #[schema(example = "Fibra 300 Mega")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "99.90")]
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    #[schema(example = 300)]
    pub bandwidth_mbps: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 2, max = 40, message = "invalid_code"))]
    pub code: String,
    #[validate(length(min = 2, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "99.90")]
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    #[validate(range(min = 1, message = "invalid_bandwidth"))]
    pub bandwidth_mbps: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    #[validate(range(min = 1, message = "invalid_bandwidth"))]
    pub bandwidth_mbps: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub is_active: Option<bool>,
    pub billing_cycle: Option<BillingCycle>,
    /// Busca por código ou nome
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn monthly_equivalent_by_cycle() {
        let price = Decimal::from_str("120.00").unwrap();
        assert_eq!(BillingCycle::Monthly.monthly_equivalent(price), price);
        assert_eq!(BillingCycle::Quarterly.monthly_equivalent(price), Decimal::from(40));
        assert_eq!(BillingCycle::Yearly.monthly_equivalent(price), Decimal::from(10));
        assert_eq!(BillingCycle::OneTime.monthly_equivalent(price), Decimal::ZERO);
    }

    #[test]
    fn monthly_equivalent_rounds_to_cents() {
        let price = Decimal::from(100);
        assert_eq!(
            BillingCycle::Quarterly.monthly_equivalent(price),
            Decimal::from_str("33.33").unwrap()
        );
    }
}
