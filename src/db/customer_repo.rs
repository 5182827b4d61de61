// src/db/customer_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{like_pattern, PageRequest},
    },
    models::customer::{
        Customer, CustomerFilter, CustomerService, CustomerServiceDetail, CustomerServiceFilter,
        ServiceStatus, UpdateCustomerPayload, UpdateCustomerServicePayload,
    },
};

const SELECT_SERVICE_DETAIL: &str = r#"
    SELECT s.*,
           p.name AS product_name,
           p.code AS product_code,
           p.billing_cycle,
           p.bandwidth_mbps
    FROM customer_services s
    JOIN products p ON p.id = s.product_id
    WHERE 1=1
"#;

// Dados de entrada já resolvidos pelo serviço (código gerado, hash da senha)
pub struct NewCustomer<'a> {
    pub customer_code: &'a str,
    pub lead_id: Option<Uuid>,
    pub name: &'a str,
    pub company: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub portal_password_hash: Option<&'a str>,
}

pub struct NewCustomerService<'a> {
    pub service_number: &'a str,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub monthly_fee: Decimal,
    pub start_date: NaiveDate,
    pub installation_address: Option<&'a str>,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        new: NewCustomer<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                customer_code, lead_id, name, company, email, phone, address, portal_password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.customer_code)
        .bind(new.lead_id)
        .bind(new.name)
        .bind(new.company)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.address)
        .bind(new.portal_password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("customers_lead_id_key") => AppError::LeadAlreadyConverted,
                        _ => AppError::UniqueConstraintViolation(format!(
                            "Cliente '{}' já cadastrado.",
                            new.customer_code
                        )),
                    };
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_by_lead<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE lead_id = $1")
            .bind(lead_id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    /// Login do portal: aceita o código do cliente ou o e-mail
    pub async fn find_by_login(&self, login: &str) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE customer_code = upper($1) OR lower(email) = lower($1)
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                company = COALESCE($3, company),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn set_portal_password(&self, id: Uuid, hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE customers SET portal_password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "O cliente possui serviços ou chamados."))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers WHERE 1=1");
        push_customer_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM customers WHERE 1=1");
        push_customer_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let customers = query.build_query_as::<Customer>().fetch_all(&self.pool).await?;

        Ok((customers, total))
    }

    // =========================================================================
    //  SERVIÇOS CONTRATADOS
    // =========================================================================

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        new: NewCustomerService<'_>,
    ) -> Result<CustomerService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CustomerService>(
            r#"
            INSERT INTO customer_services (
                service_number, customer_id, product_id, monthly_fee, start_date,
                installation_address, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.service_number)
        .bind(new.customer_id)
        .bind(new.product_id)
        .bind(new.monthly_fee)
        .bind(new.start_date)
        .bind(new.installation_address)
        .bind(new.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_constraint(e, format!("Serviço '{}' já existe.", new.service_number)))
    }

    pub async fn find_service(&self, id: Uuid) -> Result<Option<CustomerService>, AppError> {
        let service = sqlx::query_as::<_, CustomerService>("SELECT * FROM customer_services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    pub async fn find_service_detail(&self, id: Uuid) -> Result<Option<CustomerServiceDetail>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_SERVICE_DETAIL);
        query.push(" AND s.id = ").push_bind(id);

        let service = query
            .build_query_as::<CustomerServiceDetail>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    pub async fn list_services_of(&self, customer_id: Uuid) -> Result<Vec<CustomerServiceDetail>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_SERVICE_DETAIL);
        query
            .push(" AND s.customer_id = ")
            .push_bind(customer_id)
            .push(" ORDER BY s.created_at ASC");

        let services = query
            .build_query_as::<CustomerServiceDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok(services)
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        payload: &UpdateCustomerServicePayload,
    ) -> Result<Option<CustomerService>, AppError> {
        let service = sqlx::query_as::<_, CustomerService>(
            r#"
            UPDATE customer_services SET
                monthly_fee = COALESCE($2, monthly_fee),
                installation_address = COALESCE($3, installation_address),
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.monthly_fee)
        .bind(&payload.installation_address)
        .bind(&payload.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Muda o status só se ainda estiver em `from`; cancelamento carimba a data de término.
    pub async fn change_service_status(
        &self,
        id: Uuid,
        from: ServiceStatus,
        to: ServiceStatus,
        end_date: Option<NaiveDate>,
    ) -> Result<Option<CustomerService>, AppError> {
        let service = sqlx::query_as::<_, CustomerService>(
            r#"
            UPDATE customer_services SET
                status = $3,
                end_date = COALESCE($4, end_date),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(end_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customer_services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "O serviço possui chamados vinculados."))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_services(
        &self,
        filter: &CustomerServiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<CustomerServiceDetail>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customer_services s WHERE 1=1");
        push_service_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SELECT_SERVICE_DETAIL);
        push_service_filters(&mut query, filter);
        query
            .push(" ORDER BY s.created_at DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let services = query
            .build_query_as::<CustomerServiceDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((services, total))
    }
}

fn push_customer_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CustomerFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (customer_code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_service_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CustomerServiceFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND s.status = ").push_bind(status);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND s.customer_id = ").push_bind(customer_id);
    }
    if let Some(product_id) = filter.product_id {
        qb.push(" AND s.product_id = ").push_bind(product_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND s.service_number ILIKE ").push_bind(like_pattern(search));
    }
}
