//! HTTP surface for the visit tracker.
//!
//! Three routes, all GET:
//! - `/` records a visit and returns a welcome line
//! - `/track-visit` records a visit and returns 204 for beacon callers
//! - `/enviar-relatorio-agora` emails a report from the current snapshot
//!
//! The manual trigger deliberately reads a snapshot instead of draining:
//! manually reported visits stay pending for the nightly drain.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::registry::VisitRegistry;
use crate::report::ReportSender;

/// Sentinel recorded when a request carries no User-Agent header.
pub const UNKNOWN_USER_AGENT: &str = "desconhecido";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<VisitRegistry>,
    pub reports: Arc<ReportSender>,
}

/// Builds the application router.
///
/// The tracking endpoints are hit cross-origin from the tracked site, so
/// the whole surface is served with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/track-visit", get(track_visit))
        .route("/enviar-relatorio-agora", get(send_report_now))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> &'static str {
    record_visit(&state, &headers, peer);
    "Bem-vindo!"
}

async fn track_visit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> StatusCode {
    record_visit(&state, &headers, peer);
    StatusCode::NO_CONTENT
}

/// Sends a report from the current snapshot, without resetting counters.
///
/// The confirmation is returned even when the send fails: the failure is
/// logged, and the HTTP caller has no durable retry to offer anyway.
async fn send_report_now(State(state): State<AppState>) -> &'static str {
    let snapshot = state.registry.snapshot();
    if let Err(e) = state.reports.send(&snapshot).await {
        error!(
            error = %e,
            total = snapshot.total(),
            "Failed to send on-demand report"
        );
    }
    "Relatório enviado!"
}

/// Records one visit attributed to the requesting client.
fn record_visit(state: &AppState, headers: &HeaderMap, peer: SocketAddr) {
    let source = source_address(headers, peer);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(UNKNOWN_USER_AGENT);

    state.registry.record_visit(&source, user_agent);
}

/// Resolves the visitor's source address: the X-Forwarded-For header when
/// present (the daemon normally sits behind a reverse proxy), else the
/// peer address of the connection.
fn source_address(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.1:52100".parse().unwrap()
    }

    #[test]
    fn forwarded_for_wins_over_peer_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9"),
        );

        assert_eq!(source_address(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        assert_eq!(source_address(&HeaderMap::new(), peer()), "192.0.2.1");
    }

    #[test]
    fn non_utf8_forwarded_for_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );

        assert_eq!(source_address(&headers, peer()), "192.0.2.1");
    }
}
