use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use common::{CustomerId, Money, OrderId, ProductId};

use crate::{
    OrderQuery, OrderUpdate, ProductDetailsUpdate, ProductRecord, Result, StockLine, StoreError,
    StoredOrder, Version,
    store::{OperationsStore, totals_per_product},
};

/// PostgreSQL-backed operations store.
///
/// Every order commit runs inside a transaction; stock guards are expressed
/// as conditional `UPDATE`s so two concurrent reservations of the same
/// product cannot race past each other, and the version check on order
/// writes rides the same `UPDATE ... WHERE version = $n` statement.
#[derive(Clone)]
pub struct PostgresOperationsStore {
    pool: PgPool,
}

impl PostgresOperationsStore {
    /// Creates a new PostgreSQL operations store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<StoredOrder> {
        Ok(StoredOrder {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            status: row.try_get("status")?,
            placed_at: row.try_get("placed_at")?,
            deleted: row.try_get("deleted")?,
            version: Version::new(row.try_get("version")?),
            body: row.try_get("body")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity: row.try_get("quantity")?,
            total_sold: row.try_get("total_sold")?,
            track_quantity: row.try_get("track_quantity")?,
            allow_out_of_stock: row.try_get("allow_out_of_stock")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, order_number, customer_id, status, placed_at, deleted, version, body";
const PRODUCT_COLUMNS: &str = "id, name, category, unit_price_cents, quantity, total_sold, \
                               track_quantity, allow_out_of_stock, created_at, updated_at";

#[async_trait]
impl OperationsStore for PostgresOperationsStore {
    async fn insert_order(
        &self,
        order: StoredOrder,
        reservations: &[StockLine],
    ) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement per product. The WHERE clause is the
        // availability guard, so check and decrement are a single atomic
        // statement; a zero row count means the guard rejected it (or the
        // product is unknown), and dropping the transaction undoes any
        // lines already applied.
        for (product_id, requested) in totals_per_product(reservations) {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - $2, total_sold = total_sold + $2, updated_at = NOW()
                WHERE id = $1
                  AND (NOT track_quantity OR allow_out_of_stock OR quantity >= $2)
                "#,
            )
            .bind(product_id.as_str())
            .bind(requested)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                        .bind(product_id.as_str())
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(match available {
                    Some(available) => StoreError::InsufficientStock {
                        product_id,
                        available,
                        requested,
                    },
                    None => StoreError::ProductNotFound(product_id),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, status, placed_at, deleted, version, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.customer_id.as_uuid())
        .bind(&order.status)
        .bind(order.placed_at)
        .bind(order.deleted)
        .bind(Version::first().as_i64())
        .bind(&order.body)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        metrics::counter!("store_order_inserts_total").increment(1);
        tracing::debug!(order_number = %order.order_number, "order inserted");
        Ok(Version::first())
    }

    async fn update_order(
        &self,
        update: OrderUpdate,
        restorations: &[StockLine],
    ) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $3, deleted = $4, body = $5, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(update.id.as_uuid())
        .bind(update.expected_version.as_i64())
        .bind(&update.status)
        .bind(update.deleted)
        .bind(&update.body)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_version) = new_version else {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                    .bind(update.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match actual {
                Some(actual) => StoreError::VersionConflict {
                    order_id: update.id,
                    expected: update.expected_version,
                    actual: Version::new(actual),
                },
                None => StoreError::OrderNotFound(update.id),
            });
        };

        for (product_id, restored) in totals_per_product(restorations) {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity + $2, total_sold = total_sold - $2, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(product_id.as_str())
            .bind(restored)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::ProductNotFound(product_id));
            }
        }

        tx.commit().await?;
        metrics::counter!("store_order_updates_total").increment(1);
        tracing::debug!(order_id = %update.id, version = new_version, "order updated");
        Ok(Version::new(new_version))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<StoredOrder>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_orders(&self, ids: &[OrderId]) -> Result<Vec<StoredOrder>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ANY($1) ORDER BY placed_at ASC"
        ))
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<StoredOrder>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        if !query.include_deleted {
            sql.push_str(" AND deleted = FALSE");
        }
        if query.placed_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND placed_at >= ${param_count}"));
        }
        if query.placed_until.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND placed_at < ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.customer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND customer_id = ${param_count}"));
        }

        sql.push_str(" ORDER BY placed_at ASC, order_number ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(from) = query.placed_from {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(until) = query.placed_until {
            sqlx_query = sqlx_query.bind(until);
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status);
        }
        if let Some(customer_id) = query.customer_id {
            sqlx_query = sqlx_query.bind(customer_id.as_uuid());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, unit_price_cents, quantity, total_sold,
                                  track_quantity, allow_out_of_stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.unit_price.cents())
        .bind(product.quantity)
        .bind(product.total_sold)
        .bind(product.track_quantity)
        .bind(product.allow_out_of_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateProduct(product.id.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>> {
        let skus: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id ASC"
        ))
        .bind(&skus)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product_details(
        &self,
        id: &ProductId,
        update: ProductDetailsUpdate,
    ) -> Result<ProductRecord> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                unit_price_cents = COALESCE($4, unit_price_cents),
                track_quantity = COALESCE($5, track_quantity),
                allow_out_of_stock = COALESCE($6, allow_out_of_stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(update.name)
        .bind(update.category)
        .bind(update.unit_price.map(|p| p.cents()))
        .bind(update.track_quantity)
        .bind(update.allow_out_of_stock)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::ProductNotFound(id.clone())),
        }
    }
}
