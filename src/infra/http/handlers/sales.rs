//! Sales handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::pagination::{DEFAULT_PAGE_LIMIT, PageRequest};
use crate::application::sales::CreateSaleCommand;

use super::sale_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{Envelope, ListEnvelope, ListQuery, SaleCreateRequest};
use crate::infra::http::state::ApiState;

pub async fn list_sales(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );

    let listing = state.sales.list(page).await.map_err(sale_to_api)?;

    Ok(Json(ListEnvelope::new(
        state.messages.resolve("sale.list.success"),
        listing.meta,
        listing.data,
    )))
}

pub async fn create_sale(
    State(state): State<ApiState>,
    Json(payload): Json<SaleCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .sales
        .create_sale(CreateSaleCommand {
            customer_id: payload.customer_id,
            product_id: payload.product_id,
            quantity: payload.quantity,
        })
        .await
        .map_err(sale_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(
            state.messages.resolve("sale.create.success"),
            sale,
        )),
    ))
}

pub async fn sale_detail(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.sales.detail(id).await.map_err(sale_to_api)?;

    Ok(Json(Envelope::new(
        state.messages.resolve("sale.detail.success"),
        detail,
    )))
}
