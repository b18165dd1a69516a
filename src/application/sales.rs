//! Sale workflow orchestration.
//!
//! `create_sale` sequences the whole write path: input validation, the
//! atomic check-read-compute-insert transaction in the repository, and the
//! post-commit blanket invalidation of the listing cache. Invalidation is
//! awaited before returning so a caller that immediately re-reads the
//! listing cannot be served a page computed before its own write.
//!
//! Reads are cache-aside: listing pages and detail views are looked up by
//! deterministic keys, computed from Postgres on a miss, and stored back
//! under their TTL.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::cache::{CacheKey, CacheStore, ListingKind};
use crate::domain::entities::{SaleDetailRecord, SaleListRecord, SaleRecord};
use crate::domain::error::DomainError;

use super::pagination::{PageRequest, Paginated};
use super::repos::{CreateSaleParams, RepoError, SaleWriteError, SalesRepo};

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("customer `{0}` not found")]
    CustomerNotFound(i64),
    #[error("product `{0}` not found")]
    ProductNotFound(i64),
    #[error("sale `{0}` not found")]
    NotFound(i64),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy)]
pub struct CreateSaleCommand {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct SaleService {
    repo: Arc<dyn SalesRepo>,
    cache: CacheStore,
}

impl SaleService {
    pub fn new(repo: Arc<dyn SalesRepo>, cache: CacheStore) -> Self {
        Self { repo, cache }
    }

    /// Create a sale at the product's current price.
    ///
    /// The unit price and total are computed server-side inside the
    /// repository transaction; the caller only supplies the quantity.
    pub async fn create_sale(&self, command: CreateSaleCommand) -> Result<SaleRecord, SaleError> {
        if command.quantity <= 0 {
            return Err(SaleError::Validation(
                "quantity must be a positive integer".to_string(),
            ));
        }

        info!(
            customer_id = command.customer_id,
            product_id = command.product_id,
            quantity = command.quantity,
            "creating sale"
        );

        let sale = self
            .repo
            .create_sale(CreateSaleParams {
                customer_id: command.customer_id,
                product_id: command.product_id,
                quantity: command.quantity,
            })
            .await
            .map_err(|err| match err {
                SaleWriteError::CustomerNotFound(id) => SaleError::CustomerNotFound(id),
                SaleWriteError::ProductNotFound(id) => SaleError::ProductNotFound(id),
                SaleWriteError::Domain(DomainError::Validation { message }) => {
                    SaleError::Validation(message)
                }
                SaleWriteError::Domain(err) => {
                    SaleError::Repo(RepoError::from_persistence(err))
                }
                SaleWriteError::Repo(err) => SaleError::Repo(err),
            })?;

        info!(
            sale_id = sale.id,
            total_amount = %sale.total_amount,
            "sale created"
        );

        // The new row can shift which sales land on which page, so the
        // whole listing namespace goes, not just the touched page.
        self.cache.invalidate_listing(ListingKind::Sales).await;

        Ok(sale)
    }

    /// List sales, serving from the cache within the TTL window.
    pub async fn list(&self, page: PageRequest) -> Result<Paginated<SaleListRecord>, SaleError> {
        let key = CacheKey::sales_page(page.page(), page.limit());

        if let Some(cached) = self.cache.get_json::<Paginated<SaleListRecord>>(&key).await {
            return Ok(cached);
        }

        let paged = self.repo.list(page).await?;
        let listing = Paginated::new(paged.rows, paged.total, page);
        self.cache.put_json(&key, &listing).await;

        Ok(listing)
    }

    /// Fetch one sale with its customer and product, cache-aside.
    pub async fn detail(&self, id: i64) -> Result<SaleDetailRecord, SaleError> {
        let key = CacheKey::sale_detail(id);

        if let Some(cached) = self.cache.get_json::<SaleDetailRecord>(&key).await {
            return Ok(cached);
        }

        let detail = self
            .repo
            .find_detail(id)
            .await?
            .ok_or(SaleError::NotFound(id))?;
        self.cache.put_json(&key, &detail).await;

        Ok(detail)
    }
}
