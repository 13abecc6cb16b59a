//! Daily report rendering and delivery.
//!
//! The report is a small HTML message: total count, per-hour breakdown in
//! ascending hour order, and the visitor detail list in arrival order.
//! Transport goes through the [`Mailer`] trait; production uses
//! [`SmtpMailer`], which opens a STARTTLS connection to the configured
//! relay, authenticates, and transmits a single message addressed from
//! and to the operator. No retries anywhere.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use visitd_core::{clock, MailConfig, VisitCounters};

/// Subject line of the daily report.
pub const REPORT_SUBJECT: &str = "Relatório Diário de Visitas";

/// Upper bound on one send attempt; a hung relay must not stall the
/// scheduler loop.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from building or delivering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The configured operator address is not a valid mailbox.
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("failed to build report message: {0}")]
    Message(#[from] lettre::error::Error),

    /// Relay connection, authentication, or transmission failure.
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The relay did not accept the message within [`SEND_TIMEOUT`].
    #[error("report send timed out after {0:?}")]
    Timeout(Duration),
}

/// Outbound transport for rendered reports.
///
/// Trait seam so tests can capture deliveries without a relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message addressed from/to the operator address.
    async fn deliver(&self, subject: &str, html_body: &str) -> Result<(), ReportError>;
}

/// SMTP mailer speaking STARTTLS to the configured relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    operator: Mailbox,
}

impl SmtpMailer {
    /// Builds the relay transport from the environment configuration.
    pub fn new(config: &MailConfig) -> Result<Self, ReportError> {
        let operator: Mailbox = config.address.parse()?;
        let credentials = Credentials::new(config.address.clone(), config.password.clone());
        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
                .port(config.smtp_port)
                .credentials(credentials)
                .build();

        Ok(Self {
            transport,
            operator,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, subject: &str, html_body: &str) -> Result<(), ReportError> {
        let message = Message::builder()
            .from(self.operator.clone())
            .to(self.operator.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Renders and dispatches visit reports.
pub struct ReportSender {
    mailer: Arc<dyn Mailer>,
}

impl ReportSender {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Sends one report built from `snapshot`.
    ///
    /// Logs a success line with the count and timestamp; errors are
    /// returned for the caller to log. Nothing here retries.
    pub async fn send(&self, snapshot: &VisitCounters) -> Result<(), ReportError> {
        let now = clock::local_now();
        let body = render_report(snapshot, now);

        tokio::time::timeout(SEND_TIMEOUT, self.mailer.deliver(REPORT_SUBJECT, &body))
            .await
            .map_err(|_| ReportError::Timeout(SEND_TIMEOUT))??;

        info!(
            total = snapshot.total(),
            at = %now.format("%H:%M:%S"),
            "Visit report delivered"
        );
        Ok(())
    }
}

/// Builds the HTML report body.
///
/// Hour buckets come out in ascending label order (the counters keep them
/// in a `BTreeMap`), details in arrival order.
pub fn render_report(snapshot: &VisitCounters, now: DateTime<FixedOffset>) -> String {
    let hours = if snapshot.hourly().is_empty() {
        String::from("<p>Nenhuma visita registrada hoje.</p>")
    } else {
        let mut list = String::from("<ul>");
        for (hour, visits) in snapshot.hourly() {
            let _ = write!(list, "<li>{hour} → {visits} visita(s)</li>");
        }
        list.push_str("</ul>");
        list
    };

    let details = if snapshot.details().is_empty() {
        String::from("<p>Sem detalhes de visitantes.</p>")
    } else {
        let mut list = String::from("<ul>");
        for visit in snapshot.details() {
            let _ = write!(
                list,
                "<li>{} - IP: {} - Navegador: {}</li>",
                visit.hour(),
                visit.source(),
                visit.user_agent()
            );
        }
        list.push_str("</ul>");
        list
    };

    format!(
        "<html><body>\
         <p>Hoje seu portfólio recebeu <strong>{total}</strong> visita(s)!</p>\
         <p>Relatório diário de acessos - {date}</p>\
         <p><strong>Horários das visitas:</strong></p>{hours}\
         <p><strong>Detalhes dos visitantes:</strong></p>{details}\
         </body></html>",
        total = snapshot.total(),
        date = now.format("%d/%m/%Y"),
    )
}
