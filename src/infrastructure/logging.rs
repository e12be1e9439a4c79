use serde_json::Value;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// JSON keys whose values never reach the logs
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password1",
    "password2",
    "current_password",
    "new_password",
    "new_password2",
    "access",
    "refresh",
    "token",
    "jwt_secret",
];

const REDACTED: &str = "[REDACTED]";

/// Console-only logging for short-lived CLI commands
pub fn init_logging(config: &LoggingConfig) {
    let filter = env_filter(config);

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).compact())
                .init();
        }
    }

    tracing::debug!("Logging initialized with level: {}", config.level);
}

/// `RUST_LOG` wins over the configured level
pub(crate) fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Copy of a JSON value with credential fields masked, at any depth
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive(key) && !value.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_json(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_FIELDS
        .iter()
        .any(|field| field.eq_ignore_ascii_case(key))
}
