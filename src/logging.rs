//! Tracing setup for hosts that do not install their own subscriber

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn base_level(value: Option<&str>) -> &'static str {
    match value {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    }
}

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `ADS_LOG` picks the crate's level. `LOG_FORMAT=json`
/// switches to JSON lines. Calling it again, or after the host installed a subscriber, is a
/// no-op. Returns whether this call installed the subscriber.
pub fn init_logging() -> bool {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = base_level(std::env::var("ADS_LOG").ok().as_deref());
        EnvFilter::new(format!("ad_bridge_ffi={level}"))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    }
}
