//! Customer CRUD.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheKey, CacheStore, ListingKind};
use crate::domain::entities::CustomerRecord;

use super::pagination::{PageRequest, Paginated};
use super::repos::{CustomerDraft, CustomerUpdate, CustomersRepo, RepoError};

#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("customer `{0}` not found")]
    NotFound(i64),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("cpf is already registered")]
    CpfTaken,
    #[error("customer has dependent records: {0}")]
    InUse(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CustomerInput {
    pub name: String,
    pub cpf: String,
}

#[derive(Clone)]
pub struct CustomerService {
    repo: Arc<dyn CustomersRepo>,
    cache: CacheStore,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomersRepo>, cache: CacheStore) -> Self {
        Self { repo, cache }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Paginated<CustomerRecord>, CustomerError> {
        let key = CacheKey::listing(ListingKind::Customers, page.page(), page.limit());

        if let Some(cached) = self.cache.get_json::<Paginated<CustomerRecord>>(&key).await {
            return Ok(cached);
        }

        let paged = self.repo.list(page).await?;
        let listing = Paginated::new(paged.rows, paged.total, page);
        self.cache.put_json(&key, &listing).await;

        Ok(listing)
    }

    pub async fn find(&self, id: i64) -> Result<CustomerRecord, CustomerError> {
        self.repo
            .find(id)
            .await?
            .ok_or(CustomerError::NotFound(id))
    }

    pub async fn create(&self, input: CustomerInput) -> Result<CustomerRecord, CustomerError> {
        let input = validate(input)?;

        let customer = self
            .repo
            .create(CustomerDraft {
                name: input.name,
                cpf: input.cpf,
            })
            .await
            .map_err(map_write_error)?;

        self.cache.invalidate_listing(ListingKind::Customers).await;
        Ok(customer)
    }

    pub async fn update(
        &self,
        id: i64,
        input: CustomerInput,
    ) -> Result<CustomerRecord, CustomerError> {
        let input = validate(input)?;

        let customer = self
            .repo
            .update(CustomerUpdate {
                id,
                name: input.name,
                cpf: input.cpf,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => CustomerError::NotFound(id),
                other => map_write_error(other),
            })?;

        self.cache.invalidate_listing(ListingKind::Customers).await;
        Ok(customer)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CustomerError> {
        let deleted = self.repo.delete(id).await.map_err(|err| match err {
            RepoError::Integrity { message } => CustomerError::InUse(message),
            other => CustomerError::Repo(other),
        })?;

        if !deleted {
            return Err(CustomerError::NotFound(id));
        }

        self.cache.invalidate_listing(ListingKind::Customers).await;
        Ok(())
    }
}

fn validate(input: CustomerInput) -> Result<CustomerInput, CustomerError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(CustomerError::Validation("name must not be empty".into()));
    }

    let cpf = input.cpf.trim().to_string();
    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CustomerError::Validation(
            "cpf must be exactly 11 digits".into(),
        ));
    }

    Ok(CustomerInput { name, cpf })
}

fn map_write_error(err: RepoError) -> CustomerError {
    match err {
        RepoError::Duplicate { constraint } if constraint.contains("cpf") => {
            CustomerError::CpfTaken
        }
        other => CustomerError::Repo(other),
    }
}
