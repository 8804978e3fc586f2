use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::error::{Result, WrapError};

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("wrap_model=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wrap_model=info"))
    }
}

fn filter_from_directive(directive: Option<&str>, verbose: bool) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| default_filter(verbose)),
        None => default_filter(verbose),
    }
}

/// Installs a compact human-readable subscriber.
pub fn init_logger(verbose: bool) -> Result<()> {
    init_compact(filter_from_directive(None, verbose))
}

/// Installs a subscriber that writes one JSON object per event.
pub fn init_json_logger() -> Result<()> {
    init_json(filter_from_directive(None, false))
}

/// Installs a subscriber for an explicit filter directive, falling back to the
/// default filter when the directive does not parse.
pub fn init_with_directive(directive: &str, json: bool) -> Result<()> {
    let filter = filter_from_directive(Some(directive), false);
    if json {
        init_json(filter)
    } else {
        init_compact(filter)
    }
}

fn init_compact(filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| WrapError::ConfigError {
            message: format!("Logger already initialized: {}", e),
        })
}

fn init_json(filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .try_init()
        .map_err(|e| WrapError::ConfigError {
            message: format!("Logger already initialized: {}", e),
        })
}
