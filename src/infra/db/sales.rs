//! Sales repository: paginated listing, joined detail reads, and the
//! atomic creation transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CreateSaleParams, PagedRows, RepoError, SaleWriteError, SalesRepo,
};
use crate::domain::entities::{
    CustomerRecord, ProductRecord, SaleDetailRecord, SaleListRecord, SaleRecord,
};
use crate::domain::money::line_total;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct SaleRow {
    id: i64,
    customer_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
    total_amount: Decimal,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord {
            id: row.id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleListRow {
    id: i64,
    quantity: i32,
    total_amount: Decimal,
    created_at: OffsetDateTime,
}

/// Flat row for the detail query; customer and product columns are aliased
/// and folded into nested records afterwards.
#[derive(Debug, FromRow)]
struct SaleDetailRow {
    id: i64,
    customer_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
    total_amount: Decimal,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    customer_name: String,
    customer_cpf: String,
    customer_created_at: OffsetDateTime,
    customer_updated_at: OffsetDateTime,
    product_name: String,
    product_description: Option<String>,
    product_price: Decimal,
    product_created_at: OffsetDateTime,
    product_updated_at: OffsetDateTime,
}

impl From<SaleDetailRow> for SaleDetailRecord {
    fn from(row: SaleDetailRow) -> Self {
        SaleDetailRecord {
            id: row.id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            customer: CustomerRecord {
                id: row.customer_id,
                name: row.customer_name,
                cpf: row.customer_cpf,
                created_at: row.customer_created_at,
                updated_at: row.customer_updated_at,
            },
            product: ProductRecord {
                id: row.product_id,
                name: row.product_name,
                description: row.product_description,
                price: row.product_price,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        }
    }
}

#[async_trait]
impl SalesRepo for PostgresRepositories {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<SaleListRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SaleListRow>(
            "SELECT id, quantity, total_amount, created_at \
             FROM sales ORDER BY id ASC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PagedRows {
            rows: rows
                .into_iter()
                .map(|row| SaleListRecord {
                    id: row.id,
                    quantity: row.quantity,
                    total_amount: row.total_amount,
                    created_at: row.created_at,
                })
                .collect(),
            total: total as u64,
        })
    }

    async fn find_detail(&self, id: i64) -> Result<Option<SaleDetailRecord>, RepoError> {
        let row = sqlx::query_as::<_, SaleDetailRow>(
            "SELECT s.id, s.customer_id, s.product_id, s.quantity, s.unit_price, \
                    s.total_amount, s.created_at, s.updated_at, \
                    c.name AS customer_name, c.cpf AS customer_cpf, \
                    c.created_at AS customer_created_at, c.updated_at AS customer_updated_at, \
                    p.name AS product_name, p.description AS product_description, \
                    p.price AS product_price, \
                    p.created_at AS product_created_at, p.updated_at AS product_updated_at \
             FROM sales s \
             JOIN customers c ON c.id = s.customer_id \
             JOIN products p ON p.id = s.product_id \
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SaleDetailRecord::from))
    }

    async fn create_sale(&self, params: CreateSaleParams) -> Result<SaleRecord, SaleWriteError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|err| SaleWriteError::Repo(map_sqlx_error(err)))?;

        // Both existence checks read from this transaction's snapshot; a
        // concurrent delete between here and the insert surfaces as a
        // foreign-key failure at commit, never as a half-written sale.
        let customer: Option<(i64,)> = sqlx::query_as("SELECT id FROM customers WHERE id = $1")
            .bind(params.customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| SaleWriteError::Repo(map_sqlx_error(err)))?;
        if customer.is_none() {
            return Err(SaleWriteError::CustomerNotFound(params.customer_id));
        }

        let product: Option<(Decimal,)> = sqlx::query_as("SELECT price FROM products WHERE id = $1")
            .bind(params.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| SaleWriteError::Repo(map_sqlx_error(err)))?;
        let Some((unit_price,)) = product else {
            return Err(SaleWriteError::ProductNotFound(params.product_id));
        };

        let total_amount = line_total(unit_price, params.quantity)?;

        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, SaleRow>(
            "INSERT INTO sales \
                 (customer_id, product_id, quantity, unit_price, total_amount, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING id, customer_id, product_id, quantity, unit_price, total_amount, \
                       created_at, updated_at",
        )
        .bind(params.customer_id)
        .bind(params.product_id)
        .bind(params.quantity)
        .bind(unit_price)
        .bind(total_amount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| SaleWriteError::Repo(map_sqlx_error(err)))?;

        tx.commit()
            .await
            .map_err(|err| SaleWriteError::Repo(map_sqlx_error(err)))?;

        Ok(row.into())
    }
}
