//! Customers handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::customers::CustomerInput;
use crate::application::pagination::{DEFAULT_PAGE_LIMIT, PageRequest};

use super::customer_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    CustomerPayload, Envelope, ListEnvelope, ListQuery, MessageEnvelope,
};
use crate::infra::http::state::ApiState;

pub async fn list_customers(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );

    let listing = state.customers.list(page).await.map_err(customer_to_api)?;

    Ok(Json(ListEnvelope::new(
        state.messages.resolve("customer.list.success"),
        listing.meta,
        listing.data,
    )))
}

pub async fn create_customer(
    State(state): State<ApiState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .customers
        .create(CustomerInput {
            name: payload.name,
            cpf: payload.cpf,
        })
        .await
        .map_err(customer_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(
            state.messages.resolve("customer.create.success"),
            customer,
        )),
    ))
}

pub async fn customer_detail(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.customers.find(id).await.map_err(customer_to_api)?;

    Ok(Json(Envelope::new(
        state.messages.resolve("customer.detail.success"),
        customer,
    )))
}

pub async fn update_customer(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .customers
        .update(
            id,
            CustomerInput {
                name: payload.name,
                cpf: payload.cpf,
            },
        )
        .await
        .map_err(customer_to_api)?;

    Ok(Json(Envelope::new(
        state.messages.resolve("customer.update.success"),
        customer,
    )))
}

pub async fn delete_customer(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.customers.delete(id).await.map_err(customer_to_api)?;

    Ok(Json(MessageEnvelope::new(
        state.messages.resolve("customer.delete.success"),
    )))
}
