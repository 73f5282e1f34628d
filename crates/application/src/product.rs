//! Catalog management.

use common::ProductId;
use domain::{Money, Product, ProductRepository, Quantity};

use crate::dto::{CreateProductRequest, ProductResponse, UpdateProductRequest, UpdateStockRequest};
use crate::error::{Result, ServiceError};

/// Service for creating and maintaining catalog products.
pub struct ProductService<S> {
    store: S,
}

impl<S: ProductRepository> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<ProductResponse> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::Validation("Product name is required".to_string()));
        }
        let price = Money::new(request.price, request.currency)?;
        let stock = Quantity::new(request.stock)?;
        let product = Product::new(request.name, request.description, price, stock)?;

        self.store.save(&product).await?;
        tracing::info!(product_id = %product.id(), "product created");
        Ok(ProductResponse::from(&product))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductResponse> {
        let product = self.load(id).await?;
        Ok(ProductResponse::from(&product))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>> {
        let products = self.store.find_all().await?;
        Ok(products.iter().map(ProductResponse::from).collect())
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: ProductId,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::Validation("Product name is required".to_string()));
        }
        let price = Money::new(request.price, request.currency)?;

        let mut product = self.load(id).await?;
        product.update_details(request.name, request.description, price)?;
        self.store.update(&product).await?;
        Ok(ProductResponse::from(&product))
    }

    #[tracing::instrument(skip(self, request), fields(stock = request.stock))]
    pub async fn update_stock(
        &self,
        id: ProductId,
        request: UpdateStockRequest,
    ) -> Result<ProductResponse> {
        let stock = Quantity::new(request.stock)?;

        let mut product = self.load(id).await?;
        product.update_stock(stock);
        self.store.update(&product).await?;
        Ok(ProductResponse::from(&product))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        if !self.store.exists_by_id(id).await? {
            return Err(ServiceError::ProductNotFound(id));
        }
        self.store.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn load(&self, id: ProductId) -> Result<Product> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::ProductNotFound(id))
    }
}
