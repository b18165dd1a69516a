//! Products handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::pagination::{DEFAULT_PAGE_LIMIT, PageRequest};
use crate::application::products::ProductInput;

use super::product_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    Envelope, ListEnvelope, ListQuery, MessageEnvelope, ProductPayload,
};
use crate::infra::http::state::ApiState;

pub async fn list_products(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );

    let listing = state.products.list(page).await.map_err(product_to_api)?;

    Ok(Json(ListEnvelope::new(
        state.messages.resolve("product.list.success"),
        listing.meta,
        listing.data,
    )))
}

pub async fn create_product(
    State(state): State<ApiState>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .products
        .create(ProductInput {
            name: payload.name,
            description: payload.description,
            price: payload.price,
        })
        .await
        .map_err(product_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(
            state.messages.resolve("product.create.success"),
            product,
        )),
    ))
}

pub async fn product_detail(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.products.find(id).await.map_err(product_to_api)?;

    Ok(Json(Envelope::new(
        state.messages.resolve("product.detail.success"),
        product,
    )))
}

pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .products
        .update(
            id,
            ProductInput {
                name: payload.name,
                description: payload.description,
                price: payload.price,
            },
        )
        .await
        .map_err(product_to_api)?;

    Ok(Json(Envelope::new(
        state.messages.resolve("product.update.success"),
        product,
    )))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.products.delete(id).await.map_err(product_to_api)?;

    Ok(Json(MessageEnvelope::new(
        state.messages.resolve("product.delete.success"),
    )))
}
