//! Shared test harness: in-memory repositories honoring the transactional
//! semantics of the Postgres implementations, plus a router builder and
//! request helpers.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

use mercato::application::customers::CustomerService;
use mercato::application::messages::MessageCatalog;
use mercato::application::pagination::PageRequest;
use mercato::application::products::ProductService;
use mercato::application::repos::{
    CreateSaleParams, CustomerDraft, CustomerUpdate, CustomersRepo, PagedRows, ProductDraft,
    ProductUpdate, ProductsRepo, RepoError, SaleWriteError, SalesRepo,
};
use mercato::application::sales::SaleService;
use mercato::cache::{CacheBackend, CacheConfig, CacheStore, MemoryBackend};
use mercato::domain::entities::{
    CustomerRecord, ProductRecord, SaleDetailRecord, SaleListRecord, SaleRecord,
};
use mercato::domain::money::line_total;
use mercato::infra::http::{ApiState, ApiTokens, build_router};

pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
struct MemState {
    customers: BTreeMap<i64, CustomerRecord>,
    products: BTreeMap<i64, ProductRecord>,
    sales: BTreeMap<i64, SaleRecord>,
    next_customer: i64,
    next_product: i64,
    next_sale: i64,
}

/// In-memory stand-in for `PostgresRepositories`. A single mutex plays the
/// role of the database transaction: `create_sale` performs its checks and
/// its insert under one guard, so failures never leave partial writes.
#[derive(Default)]
pub struct MemoryRepositories {
    state: Mutex<MemState>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().expect("memory repo lock")
    }

    /// Seed a customer without going through the service layer.
    pub fn seed_customer(&self, name: &str, cpf: &str) -> CustomerRecord {
        let mut state = self.lock();
        state.next_customer += 1;
        let now = OffsetDateTime::now_utc();
        let record = CustomerRecord {
            id: state.next_customer,
            name: name.to_string(),
            cpf: cpf.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.customers.insert(record.id, record.clone());
        record
    }

    /// Seed a product without going through the service layer.
    pub fn seed_product(&self, name: &str, price: &str) -> ProductRecord {
        let mut state = self.lock();
        state.next_product += 1;
        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: state.next_product,
            name: name.to_string(),
            description: None,
            price: price.parse().expect("literal decimal"),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(record.id, record.clone());
        record
    }

    /// Insert a sale directly, bypassing the service layer and therefore
    /// the cache invalidation path. Used to prove staleness behavior.
    pub fn seed_sale_behind_cache(&self, customer_id: i64, product_id: i64, quantity: i32) {
        let mut state = self.lock();
        let unit_price = state
            .products
            .get(&product_id)
            .expect("seeded product")
            .price;
        let total_amount = line_total(unit_price, quantity).expect("valid quantity");
        state.next_sale += 1;
        let now = OffsetDateTime::now_utc();
        let record = SaleRecord {
            id: state.next_sale,
            customer_id,
            product_id,
            quantity,
            unit_price,
            total_amount,
            created_at: now,
            updated_at: now,
        };
        state.sales.insert(record.id, record.clone());
    }

    pub fn sale_count(&self) -> usize {
        self.lock().sales.len()
    }
}

fn page_of<T: Clone>(items: Vec<T>, page: PageRequest) -> PagedRows<T> {
    let total = items.len() as u64;
    let rows = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    PagedRows { rows, total }
}

#[async_trait]
impl CustomersRepo for MemoryRepositories {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<CustomerRecord>, RepoError> {
        let state = self.lock();
        Ok(page_of(state.customers.values().cloned().collect(), page))
    }

    async fn find(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        Ok(self.lock().customers.get(&id).cloned())
    }

    async fn create(&self, draft: CustomerDraft) -> Result<CustomerRecord, RepoError> {
        let mut state = self.lock();
        if state.customers.values().any(|c| c.cpf == draft.cpf) {
            return Err(RepoError::Duplicate {
                constraint: "customers_cpf_unique".to_string(),
            });
        }
        state.next_customer += 1;
        let now = OffsetDateTime::now_utc();
        let record = CustomerRecord {
            id: state.next_customer,
            name: draft.name,
            cpf: draft.cpf,
            created_at: now,
            updated_at: now,
        };
        state.customers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, update: CustomerUpdate) -> Result<CustomerRecord, RepoError> {
        let mut state = self.lock();
        if state
            .customers
            .values()
            .any(|c| c.id != update.id && c.cpf == update.cpf)
        {
            return Err(RepoError::Duplicate {
                constraint: "customers_cpf_unique".to_string(),
            });
        }
        let record = state
            .customers
            .get_mut(&update.id)
            .ok_or(RepoError::NotFound)?;
        record.name = update.name;
        record.cpf = update.cpf;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let mut state = self.lock();
        if !state.customers.contains_key(&id) {
            return Ok(false);
        }
        if state.sales.values().any(|s| s.customer_id == id) {
            return Err(RepoError::Integrity {
                message: "update or delete on table \"customers\" violates foreign key \
                          constraint \"sales_customer_id_fkey\" on table \"sales\""
                    .to_string(),
            });
        }
        state.customers.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ProductsRepo for MemoryRepositories {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<ProductRecord>, RepoError> {
        let state = self.lock();
        Ok(page_of(state.products.values().cloned().collect(), page))
    }

    async fn find(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn create(&self, draft: ProductDraft) -> Result<ProductRecord, RepoError> {
        let mut state = self.lock();
        state.next_product += 1;
        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: state.next_product,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, update: ProductUpdate) -> Result<ProductRecord, RepoError> {
        let mut state = self.lock();
        let record = state
            .products
            .get_mut(&update.id)
            .ok_or(RepoError::NotFound)?;
        record.name = update.name;
        record.description = update.description;
        record.price = update.price;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let mut state = self.lock();
        if !state.products.contains_key(&id) {
            return Ok(false);
        }
        if state.sales.values().any(|s| s.product_id == id) {
            return Err(RepoError::Integrity {
                message: "update or delete on table \"products\" violates foreign key \
                          constraint \"sales_product_id_fkey\" on table \"sales\""
                    .to_string(),
            });
        }
        state.products.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl SalesRepo for MemoryRepositories {
    async fn list(&self, page: PageRequest) -> Result<PagedRows<SaleListRecord>, RepoError> {
        let state = self.lock();
        let rows = state
            .sales
            .values()
            .map(|sale| SaleListRecord {
                id: sale.id,
                quantity: sale.quantity,
                total_amount: sale.total_amount,
                created_at: sale.created_at,
            })
            .collect();
        Ok(page_of(rows, page))
    }

    async fn find_detail(&self, id: i64) -> Result<Option<SaleDetailRecord>, RepoError> {
        let state = self.lock();
        let Some(sale) = state.sales.get(&id) else {
            return Ok(None);
        };
        let customer = state
            .customers
            .get(&sale.customer_id)
            .cloned()
            .ok_or_else(|| RepoError::from_persistence("dangling customer reference"))?;
        let product = state
            .products
            .get(&sale.product_id)
            .cloned()
            .ok_or_else(|| RepoError::from_persistence("dangling product reference"))?;
        Ok(Some(SaleDetailRecord {
            id: sale.id,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            total_amount: sale.total_amount,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
            customer,
            product,
        }))
    }

    async fn create_sale(&self, params: CreateSaleParams) -> Result<SaleRecord, SaleWriteError> {
        let mut state = self.lock();

        if !state.customers.contains_key(&params.customer_id) {
            return Err(SaleWriteError::CustomerNotFound(params.customer_id));
        }
        let unit_price: Decimal = match state.products.get(&params.product_id) {
            Some(product) => product.price,
            None => return Err(SaleWriteError::ProductNotFound(params.product_id)),
        };

        let total_amount = line_total(unit_price, params.quantity)?;

        state.next_sale += 1;
        let now = OffsetDateTime::now_utc();
        let record = SaleRecord {
            id: state.next_sale,
            customer_id: params.customer_id,
            product_id: params.product_id,
            quantity: params.quantity,
            unit_price,
            total_amount,
            created_at: now,
            updated_at: now,
        };
        state.sales.insert(record.id, record.clone());
        Ok(record)
    }
}

pub struct TestApp {
    pub router: Router,
    pub repos: Arc<MemoryRepositories>,
    pub backend: Arc<MemoryBackend>,
    pub state: ApiState,
}

pub fn build_app() -> TestApp {
    build_app_with_cache(CacheConfig::default())
}

pub fn build_app_with_cache(config: CacheConfig) -> TestApp {
    let repos = Arc::new(MemoryRepositories::new());
    let backend = Arc::new(MemoryBackend::new());
    let cache_backend: Arc<dyn CacheBackend> = backend.clone();
    let cache = CacheStore::new(cache_backend, config);

    let customers_repo: Arc<dyn CustomersRepo> = repos.clone();
    let products_repo: Arc<dyn ProductsRepo> = repos.clone();
    let sales_repo: Arc<dyn SalesRepo> = repos.clone();

    let state = ApiState {
        customers: Arc::new(CustomerService::new(customers_repo, cache.clone())),
        products: Arc::new(ProductService::new(products_repo, cache.clone())),
        sales: Arc::new(SaleService::new(sales_repo, cache.clone())),
        tokens: Arc::new(ApiTokens::new(vec![TEST_TOKEN.to_string()])),
        messages: Arc::new(MessageCatalog::new()),
        cache,
        db: None,
    };

    TestApp {
        router: build_router(state.clone()),
        repos,
        backend,
        state,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, value)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, Some(TEST_TOKEN), None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(TEST_TOKEN), Some(body))
            .await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(TEST_TOKEN), Some(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, Some(TEST_TOKEN), None)
            .await
    }
}
