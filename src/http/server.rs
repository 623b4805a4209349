//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeouts, body and
//!   concurrency limits, security headers)
//! - Apply hot-reloaded configuration
//! - Run until the shutdown signal, then flush the store

use arc_swap::ArcSwap;
use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::GatewayConfig;
use crate::http::error::json_error_fallback;
use crate::http::{contact, newsletter, public, webhook};
use crate::mail::Mailer;
use crate::security::rate_limit::{spawn_sweeper, RateLimiter};
use crate::store::MessageStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ArcSwap<GatewayConfig>>,
    pub limiter: Arc<RateLimiter>,
    pub store: MessageStore,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: GatewayConfig, store: MessageStore, mailer: Mailer) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            limiter: Arc::new(RateLimiter::new()),
            store,
            mailer,
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GatewayConfig> {
        self.config.load_full()
    }

    /// Swap in a reloaded configuration. Listener, body-limit and mail
    /// transport settings take effect on restart only.
    pub fn update_config(&self, config: GatewayConfig) {
        tracing::info!(
            allowed_origins = config.security.allowed_origins.len(),
            contact_limit = config.contact.rate_limit.max_requests,
            "Configuration reloaded"
        );
        self.config.store(Arc::new(config));
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweep_every = Duration::from_secs(self.state.config().rate_limit.sweep_interval_secs);
        let sweeper = spawn_sweeper(self.state.limiter.clone(), sweep_every);

        let reload_state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_state.update_config(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        sweeper.abort();
        reloader.abort();

        if let Err(e) = self.state.store.flush().await {
            tracing::error!(error = %e, "Failed to flush store on shutdown");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config();

    let mut router = Router::new()
        .route("/health", get(public::health))
        .route("/api/news", get(public::news))
        .route(
            "/api/contact",
            post(contact::submit_contact).get(admin::handlers::list_messages),
        )
        .route(
            "/api/contact/{id}",
            get(admin::handlers::get_message).patch(admin::handlers::update_message),
        )
        .route("/api/newsletter", post(newsletter::subscribe))
        .route("/api/webhooks/email-received", post(webhook::email_received))
        .merge(admin::routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::map_response(json_error_fallback));

    if config.security.enable_headers {
        router = router
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ));
    }

    router
        .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
