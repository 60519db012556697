//! Route definitions for the warehouse tracking API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/warehouse", warehouse_routes())
        .nest("/orders", order_routes())
}

/// Warehouse stock routes
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(handlers::scan_barcode))
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/items/:id",
            get(handlers::get_item)
                .put(handlers::adjust_item)
                .delete(handlers::delete_item),
        )
        .route("/items/:id/exit", post(handlers::record_exit))
        .route("/items/:id/return", post(handlers::record_return))
        .route("/items/:id/return/check", post(handlers::check_return))
        .route("/items/:id/movements", get(handlers::list_item_movements))
        .route("/movements", get(handlers::list_movements))
        .route("/summary", get(handlers::get_warehouse_summary))
        .route("/stock-suggestion", get(handlers::get_stock_suggestion))
}

/// Order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/receivable", get(handlers::list_receivable_orders))
        .route(
            "/warehouse-summary",
            get(handlers::get_order_warehouse_summary),
        )
        .route(
            "/:id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:id/status", put(handlers::update_order_status))
        .route(
            "/:id/warehouse-status",
            get(handlers::get_order_warehouse_status),
        )
        .route("/:id/receive", post(handlers::receive_order))
}
