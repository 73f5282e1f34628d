use std::str::FromStr;

use async_trait::async_trait;
use common::{BasketId, OrderId, ProductId};
use domain::{
    Basket, BasketItem, BasketRepository, Money, Order, OrderItem, OrderRepository, OrderStatus,
    Product, ProductRepository, Quantity, RepositoryError, RepositoryResult, Transaction,
    UnitOfWork,
};
use sqlx::{PgConnection, PgPool, Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::StoreError;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_amount, price_currency, stock, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, total_amount, total_currency, status, created_at, updated_at";

/// PostgreSQL-backed store implementing every repository and the unit of work.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> crate::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn db(err: sqlx::Error) -> RepositoryError {
    StoreError::Database(err).into()
}

fn money(
    entity: &'static str,
    id: Uuid,
    amount: i64,
    currency: String,
) -> RepositoryResult<Money> {
    Money::new(amount, currency).map_err(|e| RepositoryError::corrupt(entity, id, e))
}

fn quantity(entity: &'static str, id: Uuid, value: i64) -> RepositoryResult<Quantity> {
    Quantity::new(value).map_err(|e| RepositoryError::corrupt(entity, id, e))
}

fn row_to_product(row: PgRow) -> RepositoryResult<Product> {
    let id: Uuid = row.try_get("id").map_err(db)?;
    let price = money(
        "Product",
        id,
        row.try_get("price_amount").map_err(db)?,
        row.try_get("price_currency").map_err(db)?,
    )?;
    let stock = quantity("Product", id, row.try_get("stock").map_err(db)?)?;

    Ok(Product::reconstruct(
        ProductId::from_uuid(id),
        row.try_get("name").map_err(db)?,
        row.try_get("description").map_err(db)?,
        price,
        stock,
        row.try_get("created_at").map_err(db)?,
        row.try_get("updated_at").map_err(db)?,
    ))
}

async fn fetch_product(
    conn: &mut PgConnection,
    id: ProductId,
    lock: bool,
) -> RepositoryResult<Option<Product>> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1{suffix}");
    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db)?;
    row.map(row_to_product).transpose()
}

async fn write_product(conn: &mut PgConnection, product: &Product) -> RepositoryResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = $2, description = $3, price_amount = $4, price_currency = $5,
            stock = $6, updated_at = $7
        WHERE id = $1
        "#,
    )
    .bind(product.id().as_uuid())
    .bind(product.name())
    .bind(product.description())
    .bind(product.price().amount())
    .bind(product.price().currency())
    .bind(i64::from(product.stock().value()))
    .bind(product.updated_at())
    .execute(&mut *conn)
    .await
    .map_err(db)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::not_found("Product", product.id()));
    }
    Ok(())
}

async fn fetch_basket(
    conn: &mut PgConnection,
    id: BasketId,
    lock: bool,
) -> RepositoryResult<Option<Basket>> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT id, created_at, updated_at FROM baskets WHERE id = $1{suffix}");
    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db)?;

    match row {
        Some(row) => Ok(Some(load_basket(conn, row).await?)),
        None => Ok(None),
    }
}

async fn load_basket(conn: &mut PgConnection, row: PgRow) -> RepositoryResult<Basket> {
    let id: Uuid = row.try_get("id").map_err(db)?;
    let item_rows = sqlx::query(
        r#"
        SELECT product_id, quantity, price_amount, price_currency
        FROM basket_items
        WHERE basket_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db)?;

    let items = item_rows
        .into_iter()
        .map(|item| {
            let price = money(
                "Basket",
                id,
                item.try_get("price_amount").map_err(db)?,
                item.try_get("price_currency").map_err(db)?,
            )?;
            let qty = quantity("Basket", id, item.try_get("quantity").map_err(db)?)?;
            let product_id: Uuid = item.try_get("product_id").map_err(db)?;
            BasketItem::new(ProductId::from_uuid(product_id), qty, price)
                .map_err(|e| RepositoryError::corrupt("Basket", id, e))
        })
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(Basket::reconstruct(
        BasketId::from_uuid(id),
        items,
        row.try_get("created_at").map_err(db)?,
        row.try_get("updated_at").map_err(db)?,
    ))
}

async fn write_basket_items(conn: &mut PgConnection, basket: &Basket) -> RepositoryResult<()> {
    sqlx::query("DELETE FROM basket_items WHERE basket_id = $1")
        .bind(basket.id().as_uuid())
        .execute(&mut *conn)
        .await
        .map_err(db)?;

    for (position, item) in basket.items().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO basket_items (basket_id, product_id, quantity, price_amount, price_currency, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(basket.id().as_uuid())
        .bind(item.product_id().as_uuid())
        .bind(i64::from(item.quantity().value()))
        .bind(item.price().amount())
        .bind(item.price().currency())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    }
    Ok(())
}

async fn write_basket(conn: &mut PgConnection, basket: &Basket) -> RepositoryResult<()> {
    let result = sqlx::query("UPDATE baskets SET updated_at = $2 WHERE id = $1")
        .bind(basket.id().as_uuid())
        .bind(basket.updated_at())
        .execute(&mut *conn)
        .await
        .map_err(db)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::not_found("Basket", basket.id()));
    }
    write_basket_items(conn, basket).await
}

async fn load_order(conn: &mut PgConnection, row: PgRow) -> RepositoryResult<Order> {
    let id: Uuid = row.try_get("id").map_err(db)?;
    let item_rows = sqlx::query(
        r#"
        SELECT product_id, quantity, price_amount, price_currency
        FROM order_items
        WHERE order_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db)?;

    let items = item_rows
        .into_iter()
        .map(|item| {
            let price = money(
                "Order",
                id,
                item.try_get("price_amount").map_err(db)?,
                item.try_get("price_currency").map_err(db)?,
            )?;
            let qty = quantity("Order", id, item.try_get("quantity").map_err(db)?)?;
            let product_id: Uuid = item.try_get("product_id").map_err(db)?;
            OrderItem::new(ProductId::from_uuid(product_id), qty, price)
                .map_err(|e| RepositoryError::corrupt("Order", id, e))
        })
        .collect::<RepositoryResult<Vec<_>>>()?;

    let total = money(
        "Order",
        id,
        row.try_get("total_amount").map_err(db)?,
        row.try_get("total_currency").map_err(db)?,
    )?;
    let status: String = row.try_get("status").map_err(db)?;
    let status =
        OrderStatus::from_str(&status).map_err(|e| RepositoryError::corrupt("Order", id, e))?;

    Ok(Order::reconstruct(
        OrderId::from_uuid(id),
        items,
        total,
        status,
        row.try_get("created_at").map_err(db)?,
        row.try_get("updated_at").map_err(db)?,
    ))
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, total_amount, total_currency, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.total().amount())
    .bind(order.total().currency())
    .bind(order.status().as_str())
    .bind(order.created_at())
    .bind(order.updated_at())
    .execute(&mut *conn)
    .await
    .map_err(db)?;

    for (position, item) in order.items().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price_amount, price_currency, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(item.product_id().as_uuid())
        .bind(i64::from(item.quantity().value()))
        .bind(item.price().amount())
        .bind(item.price().currency())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for PostgresStore {
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id()))]
    async fn save(&self, product: &Product) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_amount, price_currency, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().amount())
        .bind(product.price().currency())
        .bind(i64::from(product.stock().value()))
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        fetch_product(&mut conn, id, false).await
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(db)?;
        rows.into_iter().map(row_to_product).collect()
    }

    #[tracing::instrument(skip(self, product), fields(product_id = %product.id()))]
    async fn update(&self, product: &Product) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        write_product(&mut conn, product).await
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        Ok(())
    }

    async fn exists_by_id(&self, id: ProductId) -> RepositoryResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }
}

#[async_trait]
impl BasketRepository for PostgresStore {
    async fn save(&self, basket: &Basket) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        sqlx::query("INSERT INTO baskets (id, created_at, updated_at) VALUES ($1, $2, $3)")
            .bind(basket.id().as_uuid())
            .bind(basket.created_at())
            .bind(basket.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        write_basket_items(&mut tx, basket).await?;
        tx.commit().await.map_err(db)
    }

    async fn find_by_id(&self, id: BasketId) -> RepositoryResult<Option<Basket>> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        fetch_basket(&mut conn, id, false).await
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Basket>> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        let rows = sqlx::query("SELECT id, created_at, updated_at FROM baskets ORDER BY created_at DESC")
            .fetch_all(&mut *conn)
            .await
            .map_err(db)?;

        let mut baskets = Vec::with_capacity(rows.len());
        for row in rows {
            baskets.push(load_basket(&mut conn, row).await?);
        }
        Ok(baskets)
    }

    #[tracing::instrument(skip(self, basket), fields(basket_id = %basket.id()))]
    async fn update(&self, basket: &Basket) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        write_basket(&mut tx, basket).await?;
        tx.commit().await.map_err(db)
    }

    async fn delete(&self, id: BasketId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM baskets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Basket", id));
        }
        Ok(())
    }

    async fn exists_by_id(&self, id: BasketId) -> RepositoryResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM baskets WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn save(&self, order: &Order) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        insert_order(&mut tx, order).await?;
        tx.commit().await.map_err(db)
    }

    async fn find_by_id(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(db)?;

        match row {
            Some(row) => Ok(Some(load_order(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await.map_err(db)?;
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await.map_err(db)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(load_order(&mut conn, row).await?);
        }
        Ok(orders)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn update(&self, order: &Order) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order.id().as_uuid())
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Order", order.id()));
        }
        Ok(())
    }

    async fn exists_by_id(&self, id: OrderId) -> RepositoryResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db)
    }
}

/// A database transaction used for checkout.
///
/// Rows read through `find_basket` and `find_product_for_update` stay locked
/// until the transaction ends. Dropping it without `commit` rolls back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> RepositoryResult<PostgresTransaction> {
        let tx = self.pool.begin().await.map_err(db)?;
        Ok(PostgresTransaction { tx })
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn find_basket(&mut self, id: BasketId) -> RepositoryResult<Option<Basket>> {
        fetch_basket(&mut self.tx, id, true).await
    }

    async fn find_product_for_update(
        &mut self,
        id: ProductId,
    ) -> RepositoryResult<Option<Product>> {
        fetch_product(&mut self.tx, id, true).await
    }

    async fn update_product(&mut self, product: &Product) -> RepositoryResult<()> {
        write_product(&mut self.tx, product).await
    }

    async fn save_order(&mut self, order: &Order) -> RepositoryResult<()> {
        insert_order(&mut self.tx, order).await
    }

    async fn update_basket(&mut self, basket: &Basket) -> RepositoryResult<()> {
        write_basket(&mut self.tx, basket).await
    }

    async fn commit(self) -> RepositoryResult<()> {
        self.tx.commit().await.map_err(db)
    }

    async fn rollback(self) -> RepositoryResult<()> {
        self.tx.rollback().await.map_err(db)
    }
}
