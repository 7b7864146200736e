//! # Chain-Scan Telemetry
//!
//! Structured logging for the Chain-Scan subsystems.
//!
//! Nothing in the core crates touches a global logger directly: each long-lived
//! component receives a [`TelemetryContext`] through its constructor and emits
//! its events inside the span that context produces. Installing a subscriber
//! is the binary's job, done once through [`init_logging`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cs_telemetry::{init_logging, TelemetryConfig, TelemetryContext};
//!
//! let _guard = init_logging(&TelemetryConfig::from_env())?;
//! let telemetry = TelemetryContext::new("header-oracle").with_chain(ChainType::Bitcoin);
//! let oracle = HeaderOracle::new(config, storage, telemetry)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_SERVICE_NAME` | `chain-scan` | Service name on every log line |
//! | `CS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CS_CONSOLE_OUTPUT` | `true` | Emit to stdout |
//! | `CS_JSON_LOGS` | `false` | JSON instead of human-readable lines |

mod config;
mod context;
mod logging;

pub use config::TelemetryConfig;
pub use context::TelemetryContext;
pub use logging::{init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Log a block-related event with standard fields.
///
/// ```rust,ignore
/// log_block_event!(info, "header-oracle", "new best chain", height, display_hash(&hash));
/// ```
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $component:expr, $msg:expr, $block_height:expr, $block_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            block_height = $block_height,
            block_hash = %$block_hash,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transaction-related event with standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $component:expr, $msg:expr, $txid:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            txid = %$txid,
            $($($field)*,)?
            $msg
        )
    };
}
