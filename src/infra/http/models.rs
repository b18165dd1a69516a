//! Request payloads and response envelopes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::pagination::PageMeta;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub name: String,
    pub cpf: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreateRequest {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// `{ message, data }` — single-resource responses.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// `{ message, paginate, data }` — paginated listing responses.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub message: String,
    pub paginate: PageMeta,
    pub data: Vec<T>,
}

impl<T> ListEnvelope<T> {
    pub fn new(message: impl Into<String>, paginate: PageMeta, data: Vec<T>) -> Self {
        Self {
            message: message.into(),
            paginate,
            data,
        }
    }
}

/// `{ message }` — delete acknowledgements.
#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}

impl MessageEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
