mod customers;
mod products;
mod sales;
mod system;

pub use customers::{create_customer, customer_detail, delete_customer, list_customers, update_customer};
pub use products::{create_product, delete_product, list_products, product_detail, update_product};
pub use sales::{create_sale, list_sales, sale_detail};
pub use system::health;

use crate::application::customers::CustomerError;
use crate::application::products::ProductError;
use crate::application::repos::RepoError;
use crate::application::sales::SaleError;

use super::error::{ApiError, codes};
use axum::http::StatusCode;

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::DUPLICATE,
            "duplicate record",
            Some(format!("violates unique constraint `{constraint}`")),
        ),
        RepoError::InvalidInput { message } => {
            ApiError::bad_request("invalid input", Some(message))
        }
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::INTEGRITY,
            "integrity violation",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "persistence failure",
            Some(message),
        ),
    }
}

pub(crate) fn sale_to_api(err: SaleError) -> ApiError {
    match err {
        SaleError::CustomerNotFound(_) => ApiError::not_found("customer not found"),
        SaleError::ProductNotFound(_) => ApiError::not_found("product not found"),
        SaleError::NotFound(_) => ApiError::not_found("sale not found"),
        SaleError::Validation(message) => {
            ApiError::validation("invalid sale payload", Some(message))
        }
        SaleError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn customer_to_api(err: CustomerError) -> ApiError {
    match err {
        CustomerError::NotFound(_) => ApiError::not_found("customer not found"),
        CustomerError::Validation(message) => {
            ApiError::validation("invalid customer payload", Some(message))
        }
        CustomerError::CpfTaken => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::DUPLICATE,
            "cpf is already registered",
            None,
        ),
        CustomerError::InUse(message) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::INTEGRITY,
            "customer has dependent sales",
            Some(message),
        ),
        CustomerError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn product_to_api(err: ProductError) -> ApiError {
    match err {
        ProductError::NotFound(_) => ApiError::not_found("product not found"),
        ProductError::Validation(message) => {
            ApiError::validation("invalid product payload", Some(message))
        }
        ProductError::InUse(message) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::INTEGRITY,
            "product has dependent sales",
            Some(message),
        ),
        ProductError::Repo(err) => repo_to_api(err),
    }
}
