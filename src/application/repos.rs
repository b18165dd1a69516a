//! Repository traits describing persistence adapters.
//!
//! Services hold these as trait objects so the Postgres implementations
//! can be swapped for in-memory fakes in tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::entities::{
    CustomerRecord, ProductRecord, SaleDetailRecord, SaleListRecord, SaleRecord,
};
use crate::domain::error::DomainError;

use super::pagination::PageRequest;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// One page of rows plus the total row count of the collection.
#[derive(Debug, Clone)]
pub struct PagedRows<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub cpf: String,
}

#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub id: i64,
    pub name: String,
    pub cpf: String,
}

#[async_trait]
pub trait CustomersRepo: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<CustomerRecord>, RepoError>;

    async fn find(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError>;

    async fn create(&self, draft: CustomerDraft) -> Result<CustomerRecord, RepoError>;

    async fn update(&self, update: CustomerUpdate) -> Result<CustomerRecord, RepoError>;

    /// Returns `false` when no row matched the id.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<ProductRecord>, RepoError>;

    async fn find(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    async fn create(&self, draft: ProductDraft) -> Result<ProductRecord, RepoError>;

    async fn update(&self, update: ProductUpdate) -> Result<ProductRecord, RepoError>;

    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CreateSaleParams {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// Failures of the sale-creation transaction.
///
/// The two not-found variants identify which referenced entity was absent
/// when the transaction read it; in every error case the transaction has
/// rolled back and nothing was persisted.
#[derive(Debug, Error)]
pub enum SaleWriteError {
    #[error("customer `{0}` does not exist")]
    CustomerNotFound(i64),
    #[error("product `{0}` does not exist")]
    ProductNotFound(i64),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[async_trait]
pub trait SalesRepo: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<SaleListRecord>, RepoError>;

    async fn find_detail(&self, id: i64) -> Result<Option<SaleDetailRecord>, RepoError>;

    /// Atomically check the referenced customer, read the product's current
    /// price, compute the total, and insert the sale. Either everything
    /// commits or nothing does.
    async fn create_sale(&self, params: CreateSaleParams) -> Result<SaleRecord, SaleWriteError>;
}
