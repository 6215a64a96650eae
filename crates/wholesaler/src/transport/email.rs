use crate::{
    abstract_trait::{NotificationReceipt, NotificationTransportTrait, TransportError},
    domain::requests::OrderData,
    transport::template::render_order_email,
};
use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use shared::config::EmailConfig;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

type SmtpTransport = AsyncSmtpTransport<Tokio1Executor>;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SmtpNotificationTransport {
    mailer: SmtpTransport,
    from: Mailbox,
    message_domain: String,
}

impl SmtpNotificationTransport {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone());

        let mailer = SmtpTransport::starttls_relay(&config.smtp_server)
            .with_context(|| format!("Failed to create SMTP relay for {}", config.smtp_server))?
            .credentials(creds)
            .port(config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let from: Mailbox = config
            .from_address
            .parse()
            .with_context(|| format!("Invalid sender address {}", config.from_address))?;

        let message_domain = from.email.domain().to_string();

        Ok(Self {
            mailer,
            from,
            message_domain,
        })
    }
}

fn classify_smtp_error(err: SmtpError) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_permanent() {
        TransportError::Bounced(err.to_string())
    } else if err.is_client() {
        TransportError::Rejected(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl NotificationTransportTrait for SmtpNotificationTransport {
    async fn send(
        &self,
        wholesaler_email: &str,
        order_data: &OrderData,
    ) -> Result<NotificationReceipt, TransportError> {
        let to: Mailbox = wholesaler_email.parse().map_err(|e| {
            error!("❌ Invalid wholesaler email {wholesaler_email}: {e}");
            TransportError::InvalidEmail(format!("{wholesaler_email}: {e}"))
        })?;

        let body = render_order_email(order_data).map_err(|e| {
            error!("❌ Failed to render wholesaler email template: {e}");
            TransportError::Template(e.to_string())
        })?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_domain);

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("New order {}", order_data.order_number))
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| {
                error!("❌ Failed to build wholesaler email: {e}");
                TransportError::Build(e.to_string())
            })?;

        match self.mailer.send(email).await {
            Ok(_) => {
                info!(
                    "✅ Order {} sent to wholesaler {}",
                    order_data.order_number, wholesaler_email
                );
                Ok(NotificationReceipt {
                    message_id: Some(message_id),
                })
            }
            Err(e) => {
                error!("❌ Failed to send order email to {wholesaler_email}: {e}");
                Err(classify_smtp_error(e))
            }
        }
    }
}
