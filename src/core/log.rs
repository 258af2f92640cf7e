use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// A valid `RUST_LOG` replaces the default filter entirely; otherwise the crate
/// and its request traces log at info (debug with `verbose`) and everything else
/// at warn.
fn env_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("warn,quotes_api={level},tower_http={level}"))
}

pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter(verbose, rust_log.as_deref()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_rust_log_can_raise_levels() {
        let filter = env_filter(false, Some("quotes_api=debug,reqwest=trace"));
        let subscriber = tracing_subscriber::registry().with(filter);
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "quotes_api::core", Level::DEBUG));
            assert!(tracing::enabled!(target: "reqwest::connect", Level::TRACE));
        });
    }

    #[test]
    fn test_default_levels() {
        let subscriber = tracing_subscriber::registry().with(env_filter(false, None));
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "quotes_api::web", Level::INFO));
            assert!(!tracing::enabled!(target: "quotes_api::web", Level::DEBUG));
            assert!(!tracing::enabled!(target: "hyper::proto", Level::INFO));
            assert!(tracing::enabled!(target: "hyper::proto", Level::WARN));
        });
    }

    #[test]
    fn test_verbose_and_invalid_rust_log() {
        let filter = env_filter(true, Some("quotes_api=loud"));
        let subscriber = tracing_subscriber::registry().with(filter);
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "tower_http::trace", Level::DEBUG));
            assert!(!tracing::enabled!(target: "hyper::proto", Level::DEBUG));
        });
    }
}
