use std::sync::Arc;

use crate::application::customers::CustomerService;
use crate::application::messages::MessageCatalog;
use crate::application::products::ProductService;
use crate::application::sales::SaleService;
use crate::cache::CacheStore;
use crate::infra::db::PostgresRepositories;

use super::middleware::ApiTokens;

#[derive(Clone)]
pub struct ApiState {
    pub customers: Arc<CustomerService>,
    pub products: Arc<ProductService>,
    pub sales: Arc<SaleService>,
    pub tokens: Arc<ApiTokens>,
    pub messages: Arc<MessageCatalog>,
    pub cache: CacheStore,
    /// Absent when the state is assembled over repository fakes in tests.
    pub db: Option<Arc<PostgresRepositories>>,
}
