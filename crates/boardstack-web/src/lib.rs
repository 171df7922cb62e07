//! BoardStack Web Server
//!
//! Axum-based REST API and live board event stream.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod tasks;

#[cfg(test)]
mod tests;

use axum::{
    routing::{get, patch, post},
    Router,
};
use boardstack_core::events::ChannelRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use config::{MailMode, ServerConfig};
use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Accounts
        .route("/users/signup", post(routes::users::sign_up))
        .route("/users/@me", get(routes::users::me))
        .route("/auth/signin", post(routes::auth::sign_in))
        .route("/auth/signout", get(routes::auth::sign_out))
        // Boards
        .route(
            "/boards",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/boards/{board_id}",
            get(routes::boards::get_board)
                .patch(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/boards/{board_id}/lists", post(routes::lists::create_list))
        .route("/boards/{board_id}/cards", post(routes::cards::create_card))
        .route(
            "/boards/{board_id}/cards/{card_id}",
            patch(routes::cards::update_card).delete(routes::cards::delete_card),
        )
        .route(
            "/boards/{board_id}/labels",
            get(routes::labels::list_labels).post(routes::labels::create_label),
        )
        .route(
            "/boards/{board_id}/labels/{label_id}",
            patch(routes::labels::update_label).delete(routes::labels::delete_label),
        )
        .route("/boards/{board_id}/members", get(routes::members::list_members))
        .route(
            "/boards/{board_id}/members/{member_id}",
            patch(routes::members::update_member).delete(routes::members::delete_member),
        )
        .route(
            "/boards/{board_id}/invitations",
            post(routes::invitations::create_invitation),
        )
        .route(
            "/boards/{board_id}/invitations/{invitation_id}",
            patch(routes::invitations::update_invitation),
        )
        .route("/boards/{board_id}/activity", get(routes::activity::list_activity))
        // Invitee side
        .route(
            "/invitations/{invitation_id}",
            get(routes::invitations::get_invitation).delete(routes::invitations::delete_invitation),
        )
        .route(
            "/invitations/{invitation_id}/accept",
            post(routes::invitations::accept_invitation),
        )
        // Live updates
        .route("/events", get(routes::events::subscribe));

    Router::new()
        .nest("/api", api_routes)
        .route("/internal/publish", post(routes::internal::publish))
        .route("/internal/stats", get(routes::internal::stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Resolve on Ctrl-C or SIGTERM, then end every open event stream so the
/// server can drain.
async fn shutdown_signal(registry: ChannelRegistry) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }

    let stats = registry.stats();
    info!(
        channels = stats.channels,
        subscribers = stats.subscribers,
        "Shutting down, closing event streams"
    );
    registry.close_all();
}

/// Run the web server until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let db = boardstack_db::init_pool(config.redis_url.as_deref()).await?;
    let state = AppState::new(db, config)?;
    let config = state.config.clone();

    let sweeper = tasks::spawn_invitation_sweeper(
        state.db.clone(),
        chrono::Duration::days(config.invitation_ttl_days),
        config.invitation_sweep_interval(),
    );

    let registry = state.registry().clone();
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    sweeper.abort();
    info!("Web server stopped");
    Ok(())
}
