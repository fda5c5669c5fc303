//! HTTP API Layer
//!
//! This crate provides the REST API for the billing system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for clients, invoices, templates,
//!   expenses, settings and the recurring run
//! - **Middleware**: Request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Scheduler**: Background recurring invoice runs
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, postgres_ports, AppState};
//!
//! let service = BillingService::new(postgres_ports(pool.clone()), clock);
//! let app = create_router(AppState::new(Arc::new(service), config).with_pool(pool));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod scheduler;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{BillingPorts, BillingService};
use infra_db::{
    PostgresClientAdapter, PostgresExpenseAdapter, PostgresInvoiceAdapter, PostgresPaymentAdapter,
    PostgresSettingsAdapter, PostgresTemplateAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{clients, expenses, health, invoices, recurring, settings, templates};
use crate::middleware::request_logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BillingService>,
    pub config: ApiConfig,
    /// Probed by the readiness check when present
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(service: Arc<BillingService>, config: ApiConfig) -> Self {
        Self {
            service,
            config,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Wires every billing port to its PostgreSQL adapter
pub fn postgres_ports(pool: PgPool) -> BillingPorts {
    BillingPorts {
        clients: Arc::new(PostgresClientAdapter::new(pool.clone())),
        invoices: Arc::new(PostgresInvoiceAdapter::new(pool.clone())),
        templates: Arc::new(PostgresTemplateAdapter::new(pool.clone())),
        payments: Arc::new(PostgresPaymentAdapter::new(pool.clone())),
        expenses: Arc::new(PostgresExpenseAdapter::new(pool.clone())),
        settings: Arc::new(PostgresSettingsAdapter::new(pool)),
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let client_routes = Router::new()
        .route("/", post(clients::create_client).get(clients::list_clients))
        .route("/:id", get(clients::get_client).put(clients::update_client))
        .route("/:id/deactivate", post(clients::deactivate_client));

    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice).get(invoices::list_invoices))
        .route("/overdue/refresh", post(invoices::refresh_overdue))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/send", post(invoices::send_invoice))
        .route(
            "/:id/payments",
            post(invoices::record_payment).get(invoices::list_payments),
        );

    let template_routes = Router::new()
        .route("/", post(templates::create_template).get(templates::list_templates))
        .route("/:id", get(templates::get_template).put(templates::update_template))
        .route("/:id/active", put(templates::set_template_active));

    let expense_routes = Router::new()
        .route("/", post(expenses::create_expense).get(expenses::list_expenses));

    let settings_routes = Router::new()
        .route(
            "/numbering/:document_type",
            get(settings::get_numbering).put(settings::put_numbering),
        )
        .route(
            "/numbering/:document_type/next",
            get(settings::preview_next_number),
        )
        .route("/general", get(settings::get_general).put(settings::put_general));

    let api_routes = Router::new()
        .nest("/clients", client_routes)
        .nest("/invoices", invoice_routes)
        .nest("/templates", template_routes)
        .nest("/expenses", expense_routes)
        .nest("/settings", settings_routes)
        .route("/recurring/process", post(recurring::process_recurring))
        .layer(axum_middleware::from_fn(request_logging));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
