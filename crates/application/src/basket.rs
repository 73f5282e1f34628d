//! Basket editing.
//!
//! Item additions take the product's current price and are checked against
//! its current stock. Stock is not reserved until checkout.

use common::{BasketId, ProductId};
use domain::{Basket, BasketRepository, Product, ProductRepository, Quantity};

use crate::dto::{AddItemRequest, BasketResponse, UpdateItemQuantityRequest};
use crate::error::{Result, ServiceError, parse_id};

/// Service for creating and editing shopping baskets.
pub struct BasketService<S> {
    store: S,
}

impl<S> BasketService<S>
where
    S: BasketRepository + ProductRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_basket(&self) -> Result<BasketResponse> {
        let basket = Basket::new();
        BasketRepository::save(&self.store, &basket).await?;
        tracing::debug!(basket_id = %basket.id(), "basket created");
        respond(&basket)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_basket(&self, id: BasketId) -> Result<BasketResponse> {
        let basket = self.load(id).await?;
        respond(&basket)
    }

    #[tracing::instrument(skip(self, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_item(&self, id: BasketId, request: AddItemRequest) -> Result<BasketResponse> {
        let product_id: ProductId = parse_id(&request.product_id)?;
        if request.quantity <= 0 {
            return Err(ServiceError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        let quantity = Quantity::new(request.quantity)?;

        let mut basket = self.load(id).await?;
        let product = self.product(product_id).await?;
        ensure_stock(&product, quantity)?;

        basket.add_item(product.id(), quantity, product.price().clone())?;
        self.persist(&basket).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, id: BasketId, product_id: ProductId) -> Result<BasketResponse> {
        let mut basket = self.load(id).await?;
        basket.remove_item(product_id)?;
        self.persist(&basket).await
    }

    /// Sets a line's quantity. Zero removes the line; any other value is
    /// checked against the product's current stock.
    #[tracing::instrument(skip(self, request), fields(quantity = request.quantity))]
    pub async fn update_item_quantity(
        &self,
        id: BasketId,
        product_id: ProductId,
        request: UpdateItemQuantityRequest,
    ) -> Result<BasketResponse> {
        let quantity = Quantity::new(request.quantity)?;
        let mut basket = self.load(id).await?;

        if quantity.is_zero() {
            basket.remove_item(product_id)?;
        } else {
            let product = self.product(product_id).await?;
            ensure_stock(&product, quantity)?;
            basket.update_item_quantity(product_id, quantity)?;
        }

        self.persist(&basket).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear_basket(&self, id: BasketId) -> Result<BasketResponse> {
        let mut basket = self.load(id).await?;
        basket.clear();
        self.persist(&basket).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_basket(&self, id: BasketId) -> Result<()> {
        if !BasketRepository::exists_by_id(&self.store, id).await? {
            return Err(ServiceError::BasketNotFound(id));
        }
        BasketRepository::delete(&self.store, id).await?;
        Ok(())
    }

    /// Builds the response before writing so a basket whose total cannot be
    /// computed is never stored.
    async fn persist(&self, basket: &Basket) -> Result<BasketResponse> {
        let response = respond(basket)?;
        BasketRepository::update(&self.store, basket).await?;
        Ok(response)
    }

    async fn load(&self, id: BasketId) -> Result<Basket> {
        BasketRepository::find_by_id(&self.store, id)
            .await?
            .ok_or(ServiceError::BasketNotFound(id))
    }

    async fn product(&self, id: ProductId) -> Result<Product> {
        ProductRepository::find_by_id(&self.store, id)
            .await?
            .ok_or(ServiceError::ProductNotFound(id))
    }
}

fn ensure_stock(product: &Product, requested: Quantity) -> Result<()> {
    if product.stock() < requested {
        return Err(ServiceError::InsufficientStock {
            product_id: product.id(),
            product_name: product.name().to_string(),
            requested: requested.value(),
            available: product.stock().value(),
        });
    }
    Ok(())
}

fn respond(basket: &Basket) -> Result<BasketResponse> {
    Ok(BasketResponse::try_from(basket)?)
}
