// src/services/product_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::ProductRepository,
    models::product::{CreateProductPayload, Product, ProductFilter, UpdateProductPayload},
};

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
}

impl ProductService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    pub async fn create_product(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = self.product_repo.create_product(payload).await?;
        tracing::info!("📦 Produto {} cadastrado", product.code);
        Ok(product)
    }

    pub async fn get_product(&self, pool: &sqlx::PgPool, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound("product"))
    }

    pub async fn update_product(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        self.product_repo
            .update_product(id, payload)
            .await?
            .ok_or(AppError::NotFound("product"))
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        if !self.product_repo.delete_product(id).await? {
            return Err(AppError::NotFound("product"));
        }
        Ok(())
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), AppError> {
        self.product_repo.list_products(filter, page).await
    }
}
