// src/services/crm_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{codes::CodeScope, error::AppError, pagination::PageRequest},
    db::{
        customer_repo::{NewCustomer, NewCustomerService},
        CustomerRepository, ProductRepository, SequenceRepository,
    },
    models::customer::{
        CreateCustomerPayload, CreateCustomerServicePayload, Customer, CustomerDetail, CustomerFilter,
        CustomerService, CustomerServiceDetail, CustomerServiceFilter, ServiceStatus,
        UpdateCustomerPayload, UpdateCustomerServicePayload,
    },
    services::auth::hash_password,
};

// Clientes e os serviços (contratos) de cada um
#[derive(Clone)]
pub struct CrmService {
    pool: PgPool,
    customer_repo: CustomerRepository,
    product_repo: ProductRepository,
    sequence_repo: SequenceRepository,
}

impl CrmService {
    pub fn new(
        pool: PgPool,
        customer_repo: CustomerRepository,
        product_repo: ProductRepository,
        sequence_repo: SequenceRepository,
    ) -> Self {
        Self { pool, customer_repo, product_repo, sequence_repo }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Cadastro direto (sem lead de origem).
    pub async fn create_customer(&self, payload: &CreateCustomerPayload) -> Result<Customer, AppError> {
        let portal_password_hash = match payload.portal_password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        // O contador e o cliente entram juntos: se o INSERT falhar, o número não é consumido
        let mut tx = self.pool.begin().await?;

        let customer_code = self
            .sequence_repo
            .next_code(&mut *tx, CodeScope::Customer, Utc::now().date_naive())
            .await?;

        let customer = self
            .customer_repo
            .create_customer(
                &mut *tx,
                NewCustomer {
                    customer_code: &customer_code,
                    lead_id: None,
                    name: payload.name.trim(),
                    company: payload.company.as_deref(),
                    email: payload.email.as_deref(),
                    phone: payload.phone.as_deref(),
                    address: payload.address.as_deref(),
                    portal_password_hash: portal_password_hash.as_deref(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🏠 Cliente {} cadastrado", customer.customer_code);
        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerDetail, AppError> {
        let customer = self
            .customer_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("customer"))?;

        let services = self.customer_repo.list_services_of(customer.id).await?;

        Ok(CustomerDetail {
            portal_access: customer.has_portal_access(),
            customer,
            services,
        })
    }

    pub async fn update_customer(&self, id: Uuid, payload: &UpdateCustomerPayload) -> Result<Customer, AppError> {
        self.customer_repo
            .update_customer(id, payload)
            .await?
            .ok_or(AppError::NotFound("customer"))
    }

    pub async fn set_portal_password(&self, id: Uuid, password: &str) -> Result<(), AppError> {
        let hashed = hash_password(password).await?;
        if !self.customer_repo.set_portal_password(id, &hashed).await? {
            return Err(AppError::NotFound("customer"));
        }
        tracing::info!("🔐 Acesso ao portal liberado para o cliente {}", id);
        Ok(())
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        if !self.customer_repo.delete_customer(id).await? {
            return Err(AppError::NotFound("customer"));
        }
        Ok(())
    }

    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        self.customer_repo.list_customers(filter, page).await
    }

    // =========================================================================
    //  SERVIÇOS CONTRATADOS
    // =========================================================================

    /// Contrata um produto ativo para o cliente. Mensalidade padrão = preço do produto.
    pub async fn create_service(
        &self,
        customer_id: Uuid,
        payload: &CreateCustomerServicePayload,
    ) -> Result<CustomerService, AppError> {
        // Checado antes de abrir a transação: find_by_id usa outra conexão do pool
        if self.customer_repo.find_by_id(customer_id).await?.is_none() {
            return Err(AppError::NotFound("customer"));
        }

        let mut tx = self.pool.begin().await?;

        let product = self
            .product_repo
            .find_by_id(&mut *tx, payload.product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        if !product.is_active {
            return Err(AppError::ProductInactive);
        }

        let today = Utc::now().date_naive();
        let service_number = self
            .sequence_repo
            .next_code(&mut *tx, CodeScope::Service, today)
            .await?;

        let service = self
            .customer_repo
            .create_service(
                &mut *tx,
                NewCustomerService {
                    service_number: &service_number,
                    customer_id,
                    product_id: product.id,
                    monthly_fee: payload.monthly_fee.unwrap_or(product.price),
                    start_date: payload.start_date.unwrap_or(today),
                    installation_address: payload.installation_address.as_deref(),
                    notes: payload.notes.as_deref(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("📡 Serviço {} ({}) ativado", service.service_number, product.code);
        Ok(service)
    }

    pub async fn get_service(&self, id: Uuid) -> Result<CustomerServiceDetail, AppError> {
        self.customer_repo
            .find_service_detail(id)
            .await?
            .ok_or(AppError::NotFound("service"))
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        payload: &UpdateCustomerServicePayload,
    ) -> Result<CustomerService, AppError> {
        self.customer_repo
            .update_service(id, payload)
            .await?
            .ok_or(AppError::NotFound("service"))
    }

    /// Suspende, reativa ou cancela. Cancelamento é definitivo e carimba a data de término.
    pub async fn change_service_status(&self, id: Uuid, target: ServiceStatus) -> Result<CustomerService, AppError> {
        let current = self
            .customer_repo
            .find_service(id)
            .await?
            .ok_or(AppError::NotFound("service"))?;

        if !current.status.can_become(target) {
            return Err(AppError::InvalidServiceTransition { from: current.status, to: target });
        }

        let end_date = (target == ServiceStatus::Terminated).then(|| Utc::now().date_naive());

        match self
            .customer_repo
            .change_service_status(id, current.status, target, end_date)
            .await?
        {
            Some(service) => {
                tracing::info!(
                    "📡 Serviço {}: {} -> {}",
                    service.service_number,
                    current.status.as_str(),
                    target.as_str()
                );
                Ok(service)
            }
            None => {
                let latest = self
                    .customer_repo
                    .find_service(id)
                    .await?
                    .ok_or(AppError::NotFound("service"))?;
                Err(AppError::InvalidServiceTransition { from: latest.status, to: target })
            }
        }
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<(), AppError> {
        if !self.customer_repo.delete_service(id).await? {
            return Err(AppError::NotFound("service"));
        }
        Ok(())
    }

    pub async fn list_services(
        &self,
        filter: &CustomerServiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<CustomerServiceDetail>, i64), AppError> {
        self.customer_repo.list_services(filter, page).await
    }

    pub async fn services_of(&self, customer_id: Uuid) -> Result<Vec<CustomerServiceDetail>, AppError> {
        self.customer_repo.list_services_of(customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use std::time::Duration;

    // Banco de verdade: DATABASE_URL=... cargo test -- --ignored
    #[sqlx::test]
    #[ignore]
    async fn provisioning_needs_a_single_connection(
        _pool_opts: PgPoolOptions,
        connect_opts: PgConnectOptions,
    ) -> sqlx::Result<()> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(2))
            .connect_with(connect_opts)
            .await?;

        let customer_id: Uuid = sqlx::query_scalar(
            "INSERT INTO customers (customer_code, name) VALUES ('CUST-20261016-001', 'Maria') RETURNING id",
        )
        .fetch_one(&pool)
        .await?;
        let product_id: Uuid = sqlx::query_scalar(
            "INSERT INTO products (code, name, price) VALUES ('FIBRA-300', 'Fibra 300', 99.90) RETURNING id",
        )
        .fetch_one(&pool)
        .await?;

        let service = CrmService::new(
            pool.clone(),
            CustomerRepository::new(pool.clone()),
            ProductRepository::new(pool.clone()),
            SequenceRepository::new(),
        );

        let payload = CreateCustomerServicePayload {
            product_id,
            monthly_fee: None,
            start_date: None,
            installation_address: None,
            notes: None,
        };

        let created = service.create_service(customer_id, &payload).await.unwrap();
        assert_eq!(created.customer_id, customer_id);
        assert_eq!(created.monthly_fee, Decimal::new(9990, 2));

        assert!(matches!(
            service.create_service(Uuid::new_v4(), &payload).await,
            Err(AppError::NotFound("customer"))
        ));
        Ok(())
    }
}
