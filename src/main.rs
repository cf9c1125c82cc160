// src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falla al inicializar el estado de la aplicación.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falla al correr las migraciones de la base de datos.");

    tracing::info!("✅ Migraciones ejecutadas");

    // Rutas públicas de autenticación
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rutas de usuario (solo requieren sesión)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Todo lo que sigue es por-tenant: auth_guard + tenant_guard (en ese orden)
    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_product).get(handlers::products::get_all_products),
        )
        .route("/low-stock", get(handlers::products::get_low_stock))
        .route("/stock-entry", post(handlers::products::stock_entry))
        .route("/{id}/movements", get(handlers::products::list_movements));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route("/{id}/payments", get(handlers::customers::list_customer_payments))
        .route("/{id}/sales", get(handlers::customers::list_customer_open_sales));

    let quotation_routes = Router::new()
        .route("/", post(handlers::quotations::create_quotation))
        .route("/{id}/convert", post(handlers::quotations::convert_quotation));

    let order_routes = Router::new()
        .route("/", post(handlers::orders::create_order))
        .route("/{id}/settle", post(handlers::orders::settle_order));

    let sale_routes = Router::new()
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/cancel", post(handlers::sales::cancel_sale));

    let payment_routes = Router::new().route("/", post(handlers::payments::create_payment));

    let collections_routes = Router::new()
        .route("/aging", get(handlers::collections::aging_report))
        .route("/alerts", get(handlers::collections::credit_alerts));

    let tenant_routes = Router::new()
        .nest("/products", product_routes)
        .nest("/customers", customer_routes)
        .nest("/quotations", quotation_routes)
        .nest("/orders", order_routes)
        .nest("/sales", sale_routes)
        .nest("/payments", payment_routes)
        .nest("/collections", collections_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api", tenant_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falla al iniciar el listener TCP");
    tracing::info!("🚀 Servidor escuchando en {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Error en el servidor Axum");
}
