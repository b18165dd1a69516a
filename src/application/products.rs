//! Product CRUD.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::cache::{CacheKey, CacheStore, ListingKind};
use crate::domain::entities::ProductRecord;

use super::pagination::{PageRequest, Paginated};
use super::repos::{ProductDraft, ProductUpdate, ProductsRepo, RepoError};

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product `{0}` not found")]
    NotFound(i64),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("product has dependent records: {0}")]
    InUse(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductsRepo>,
    cache: CacheStore,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductsRepo>, cache: CacheStore) -> Self {
        Self { repo, cache }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Paginated<ProductRecord>, ProductError> {
        let key = CacheKey::listing(ListingKind::Products, page.page(), page.limit());

        if let Some(cached) = self.cache.get_json::<Paginated<ProductRecord>>(&key).await {
            return Ok(cached);
        }

        let paged = self.repo.list(page).await?;
        let listing = Paginated::new(paged.rows, paged.total, page);
        self.cache.put_json(&key, &listing).await;

        Ok(listing)
    }

    pub async fn find(&self, id: i64) -> Result<ProductRecord, ProductError> {
        self.repo.find(id).await?.ok_or(ProductError::NotFound(id))
    }

    pub async fn create(&self, input: ProductInput) -> Result<ProductRecord, ProductError> {
        let input = validate(input)?;

        let product = self
            .repo
            .create(ProductDraft {
                name: input.name,
                description: input.description,
                price: input.price,
            })
            .await?;

        self.cache.invalidate_listing(ListingKind::Products).await;
        Ok(product)
    }

    pub async fn update(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<ProductRecord, ProductError> {
        let input = validate(input)?;

        let product = self
            .repo
            .update(ProductUpdate {
                id,
                name: input.name,
                description: input.description,
                price: input.price,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => ProductError::NotFound(id),
                other => ProductError::Repo(other),
            })?;

        self.cache.invalidate_listing(ListingKind::Products).await;
        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ProductError> {
        let deleted = self.repo.delete(id).await.map_err(|err| match err {
            RepoError::Integrity { message } => ProductError::InUse(message),
            other => ProductError::Repo(other),
        })?;

        if !deleted {
            return Err(ProductError::NotFound(id));
        }

        self.cache.invalidate_listing(ListingKind::Products).await;
        Ok(())
    }
}

fn validate(input: ProductInput) -> Result<ProductInput, ProductError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ProductError::Validation("name must not be empty".into()));
    }

    if input.price.is_sign_negative() {
        return Err(ProductError::Validation(
            "price must not be negative".into(),
        ));
    }

    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(ProductInput {
        name,
        description,
        price: input.price,
    })
}
