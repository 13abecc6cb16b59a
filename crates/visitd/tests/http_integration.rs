//! Integration tests for the HTTP surface.
//!
//! These drive the full router (routes, state, CORS layer) through
//! tower's `oneshot`, with a recording mailer standing in for the SMTP
//! relay and `MockConnectInfo` standing in for a real peer socket.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use visitd::http::{router, AppState};
use visitd::registry::VisitRegistry;
use visitd::report::{Mailer, ReportError, ReportSender};

// ============================================================================
// Test Helpers
// ============================================================================

/// Peer address injected for every test request.
const PEER_ADDR: &str = "10.0.0.1:40000";

/// Mailer double that records deliveries instead of talking SMTP.
#[derive(Default)]
struct RecordingMailer {
    deliveries: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    fn failing() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn delivered(&self) -> Vec<(String, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, subject: &str, html_body: &str) -> Result<(), ReportError> {
        if self.fail {
            return Err(ReportError::Timeout(Duration::from_secs(0)));
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

/// Fully wired application plus handles into its collaborators.
struct TestApp {
    app: Router,
    registry: Arc<VisitRegistry>,
    mailer: Arc<RecordingMailer>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    fn with_mailer(mailer: RecordingMailer) -> Self {
        let registry = Arc::new(VisitRegistry::new());
        let mailer = Arc::new(mailer);
        let dyn_mailer: Arc<dyn Mailer> = mailer.clone();
        let reports = Arc::new(ReportSender::new(dyn_mailer));

        let peer: SocketAddr = PEER_ADDR.parse().expect("peer address parses");
        let app = router(AppState {
            registry: Arc::clone(&registry),
            reports,
        })
        .layer(MockConnectInfo(peer));

        Self {
            app,
            registry,
            mailer,
        }
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.request(Request::builder().uri(uri)).await
    }

    async fn request(&self, builder: axum::http::request::Builder) -> axum::response::Response {
        let request = builder.body(Body::empty()).expect("request builds");
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router never errors")
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn home_records_a_visit_and_greets() {
    let test = TestApp::new();

    let response = test.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Bem-vindo!");

    let snapshot = test.registry.snapshot();
    assert_eq!(snapshot.total(), 1);
    assert_eq!(snapshot.details()[0].source(), "10.0.0.1");
    assert_eq!(snapshot.details()[0].user_agent(), "desconhecido");
}

#[tokio::test]
async fn track_visit_returns_no_content_with_empty_body() {
    let test = TestApp::new();

    let response = test.get("/track-visit").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_text(response).await.is_empty());

    assert_eq!(test.registry.snapshot().total(), 1);
}

#[tokio::test]
async fn forwarded_for_and_user_agent_headers_are_honored() {
    let test = TestApp::new();

    let response = test
        .request(
            Request::builder()
                .uri("/track-visit")
                .header("x-forwarded-for", "203.0.113.9")
                .header(header::USER_AGENT, "Mozilla/5.0"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let snapshot = test.registry.snapshot();
    assert_eq!(snapshot.details()[0].source(), "203.0.113.9");
    assert_eq!(snapshot.details()[0].user_agent(), "Mozilla/5.0");
}

#[tokio::test]
async fn send_now_reports_the_snapshot_without_resetting() {
    let test = TestApp::new();

    test.get("/").await;
    test.get("/track-visit").await;

    let response = test.get("/enviar-relatorio-agora").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Relatório enviado!");

    let deliveries = test.mailer.delivered();
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].1.contains("<strong>2</strong>"));

    // Counters stay pending for the nightly drain.
    assert_eq!(test.registry.snapshot().total(), 2);
}

#[tokio::test]
async fn send_now_confirms_even_when_the_relay_fails() {
    let test = TestApp::with_mailer(RecordingMailer::failing());

    test.get("/").await;

    let response = test.get("/enviar-relatorio-agora").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Relatório enviado!");

    assert!(test.mailer.delivered().is_empty());
    assert_eq!(test.registry.snapshot().total(), 1);
}

#[tokio::test]
async fn manual_trigger_does_not_record_a_visit() {
    let test = TestApp::new();

    test.get("/enviar-relatorio-agora").await;
    assert_eq!(test.registry.snapshot().total(), 0);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let test = TestApp::new();

    let response = test.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(test.registry.snapshot().total(), 0);
}
