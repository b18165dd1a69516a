use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CustomerDraft, CustomerUpdate, CustomersRepo, PagedRows, RepoError,
};
use crate::domain::entities::CustomerRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    cpf: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        CustomerRecord {
            id: row.id,
            name: row.name,
            cpf: row.cpf,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, cpf, created_at, updated_at";

#[async_trait]
impl CustomersRepo for PostgresRepositories {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<CustomerRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PagedRows {
            rows: rows.into_iter().map(CustomerRecord::from).collect(),
            total: total as u64,
        })
    }

    async fn find(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CustomerRecord::from))
    }

    async fn create(&self, draft: CustomerDraft) -> Result<CustomerRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (name, cpf, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.cpf)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update(&self, update: CustomerUpdate) -> Result<CustomerRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE customers SET name = $2, cpf = $3, updated_at = $4 \
             WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(update.id)
        .bind(&update.name)
        .bind(&update.cpf)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
