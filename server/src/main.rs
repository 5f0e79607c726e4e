use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ogp_server::cache::MetadataCache;
use ogp_server::config::Config;
use ogp_server::extractor::MetadataExtractor;
use ogp_server::routes::create_router;
use ogp_server::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ogp_server=info,tower_http=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 OGP server starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!(
        cache_capacity = config.cache_capacity,
        cache_empty_results = config.cache_empty_results,
        coalesce_requests = config.coalesce_requests,
        fetch_timeout = ?config.fetch_timeout,
        block_private_addresses = config.block_private_addresses,
        "📝 Configuration loaded"
    );

    if !config.cache_empty_results {
        info!("Empty and failed lookups will not be cached");
    }

    let cache = MetadataCache::new(config.cache_capacity);
    let extractor = MetadataExtractor::new(cache, config.extractor_config())
        .expect("Failed to build HTTP client");

    if let Some(url) = &config.default_target_url {
        info!("🎯 Default target URL: {}", url);
    }

    let app_state = AppState::new(extractor, config.default_target_url.clone());

    // Prometheus metrics layer
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = create_router(app_state)
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(prometheus_layer);

    let addr = config.server_addr();
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
