//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    create_metrics_router, init_metrics, record_account_registered, record_http_request,
    record_login, record_token_refreshed, LoginResult, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
