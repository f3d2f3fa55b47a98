use std::{env, ffi::OsStr, io};

use tracing::dispatcher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const KEY: &str = "RUST_LOG";

fn init_once_subscriber(export: bool) {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return;
    }

    // Set default service name
    {
        const SERVICE_NAME_KEY: &str = "OTEL_SERVICE_NAME";
        const SERVICE_NAME_VALUE: &str = "pier";

        if env::var_os(SERVICE_NAME_KEY).is_none() {
            env::set_var(SERVICE_NAME_KEY, SERVICE_NAME_VALUE);
        }
    }

    // stdout is reserved for rendered documents
    let layer = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(::tracing_subscriber::fmt::layer().with_writer(io::stderr));

    #[cfg(feature = "otlp")]
    let layer = layer.with(if export {
        init_otlp_tracer().map(::tracing_opentelemetry::OpenTelemetryLayer::new)
    } else {
        None
    });
    #[cfg(not(feature = "otlp"))]
    let _ = export;

    layer.try_init().ok();
}

#[cfg(feature = "otlp")]
fn init_otlp_tracer() -> Option<::opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_otlp as otlp;
    use opentelemetry_sdk::runtime::Tokio as Runtime;

    match otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp::new_exporter().tonic())
        .install_batch(Runtime)
    {
        Ok(tracer) => Some(tracer),
        Err(error) => {
            eprintln!("failed to init an otlp tracer: {error}");
            None
        }
    }
}

pub fn init_once() {
    init_once_with_default(true)
}

pub fn init_once_with(level: impl AsRef<OsStr>, export: bool) {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return;
    }

    // set custom tracing level
    env::set_var(KEY, level);

    init_once_subscriber(export)
}

pub fn init_once_with_default(export: bool) {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return;
    }

    // set default tracing level
    if env::var_os(KEY).is_none() {
        env::set_var(KEY, "INFO");
    }

    init_once_subscriber(export)
}

pub fn init_once_with_level_int(level: u8, export: bool) {
    init_once_with(level_name(level), export)
}

/// Maps a repeated `-d` flag count onto a tracing level.
pub fn level_name(level: u8) -> &'static str {
    match level {
        0 => "WARN",
        1 => "INFO",
        2 => "DEBUG",
        _ => "TRACE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_name_saturates() {
        assert_eq!(level_name(0), "WARN");
        assert_eq!(level_name(1), "INFO");
        assert_eq!(level_name(2), "DEBUG");
        assert_eq!(level_name(3), "TRACE");
        assert_eq!(level_name(7), "TRACE");
    }

    #[test]
    fn init_is_idempotent() {
        init_once_with_default(false);
        init_once_with_level_int(3, false);

        assert!(dispatcher::has_been_set());
    }
}
