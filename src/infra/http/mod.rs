pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use middleware::ApiTokens;
pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};

/// Assemble the API router. Every route except `/health` sits behind
/// token auth; response logging wraps everything.
pub fn build_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route(
            "/sales",
            get(handlers::list_sales).post(handlers::create_sale),
        )
        .route("/sales/{id}", get(handlers::sale_detail))
        .route(
            "/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/customers/{id}",
            get(handlers::customer_detail)
                .patch(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::product_detail)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
        .route("/health", get(handlers::health))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}
