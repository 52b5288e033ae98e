//! Route definitions for the cafeteria backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/employees", employee_routes())
        .nest("/schedule", schedule_routes())
        .route("/attendance", get(handlers::list_attendance))
        .nest("/supplies", supply_routes())
        .nest("/products", product_routes())
        .route(
            "/recipe-items/:id",
            put(handlers::update_recipe_item).delete(handlers::remove_recipe_item),
        )
        .nest("/customers", customer_routes())
        .nest("/sales", sale_routes())
        .route("/reports/payroll", get(handlers::get_payroll_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Attendance kiosk (public, password checked per punch)
        .route("/attendance/clock", post(handlers::clock))
        .merge(protected)
}

/// Employee management routes (protected)
fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_employees).post(handlers::create_employee))
        .route("/:id", get(handlers::get_employee).put(handlers::update_employee))
        .route("/:id/deactivate", post(handlers::deactivate_employee))
}

/// Schedule routes (protected)
fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/week", get(handlers::get_week_schedule))
        .route("/generate", post(handlers::generate_week_schedule))
        .route("/cells", post(handlers::create_schedule_cell))
        .route(
            "/cells/:id",
            put(handlers::update_schedule_cell).delete(handlers::delete_schedule_cell),
        )
}

/// Supply routes (protected)
fn supply_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_supplies).post(handlers::create_supply))
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/summary", get(handlers::get_inventory_summary))
        .route("/:id", get(handlers::get_supply).put(handlers::update_supply))
        .route("/:id/deactivate", post(handlers::deactivate_supply))
}

/// Product and recipe routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/:id", get(handlers::get_product).put(handlers::update_product))
        .route("/:id/deactivate", post(handlers::deactivate_product))
        .route("/:id/recipe", post(handlers::add_recipe_item))
}

/// Customer routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_customers).post(handlers::create_customer))
        .route("/:id", get(handlers::get_customer).put(handlers::update_customer))
        .route("/:id/deactivate", post(handlers::deactivate_customer))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::record_sale))
        .route("/:id", get(handlers::get_sale))
}
