//! Tracing setup and request-scoped trace IDs.
//!
//! `init_tracing` is safe to call more than once; only the first call
//! installs the subscriber and the `log::` bridge. Trace IDs travel in
//! task-local storage so error responses can echo them without threading a
//! context argument through every call.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Request correlation data carried through task-local storage.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

/// Failure modes of global telemetry installation.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("log tracer bridge installation failed: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("tracing subscriber installation failed: {0}")]
    Subscriber(#[from] TryInitError),
}

static TRACING_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Route legacy `log::` macros into the tracing pipeline.
///
/// A second registration attempt (tests, embedding) is tolerated when the
/// registered logger already is a `LogTracer`.
fn install_log_bridge() {
    let result = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    if let Err(err) = result {
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!(
                "Warning: log tracer bridge not installed ({err}); legacy `log::` macros will bypass structured tracing."
            );
        }
    }
}

/// Install the global subscriber once.
///
/// The formatter comes from `LAUNCHPAD_LOG_FORMAT` (`json` default,
/// `pretty` opt-in); the filter from `RUST_LOG`, falling back to
/// `LAUNCHPAD_LOG_LEVEL`.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    let first_call = TRACING_INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();
    if !first_call {
        return Ok(());
    }

    install_log_bridge();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(&config.log_level),
    };
    let fmt_layer = if config.log_format == "pretty" {
        fmt::layer().pretty().boxed()
    } else {
        fmt::layer().json().boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    if let Err(err) = installed {
        TRACING_INSTALLED.store(false, Ordering::SeqCst);
        eprintln!(
            "Warning: global tracing subscriber not installed ({err}); the default subscriber stays active."
        );
    }

    Ok(())
}

/// Run `future` with `context` visible to [`current_trace_id`] for its
/// whole duration.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Trace ID of the running task, when one has been set.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}
