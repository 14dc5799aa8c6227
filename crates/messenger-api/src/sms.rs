//! Outgoing SMS relay.
//!
//! The gateway is a seam: handlers only see [`SmsGateway`], the server wires
//! in [`TwilioGateway`] (or [`DisabledGateway`] when no credentials are set),
//! tests wire in a fake.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Error, Debug)]
pub enum SmsError {
    #[error("SMS gateway is not configured")]
    NotConfigured,

    #[error("Recipient and body are required")]
    MissingInput,

    #[error("Failed to send message: {0}")]
    Rejected(String),

    #[error("Unexpected error occurred while sending message: {0}")]
    Http(#[from] reqwest::Error),
}

pub trait SmsGateway: Send + Sync {
    /// Hand a message to the gateway. Resolves to the gateway's delivery id.
    fn send_sms<'a>(&'a self, to: &'a str, body: &'a str) -> BoxFuture<'a, Result<String, SmsError>>;
}

/// Twilio account settings.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    /// Prefixed to numbers that do not already start with `+`.
    pub country_code: String,
    /// Upper bound on one Messages request, connect included.
    pub timeout: Duration,
}

/// Sends through Twilio's Messages REST resource.
pub struct TwilioGateway {
    client: Client,
    config: TwilioConfig,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig) -> Result<Self, SmsError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    async fn send(&self, to: &str, body: &str) -> Result<String, SmsError> {
        if to.trim().is_empty() || body.trim().is_empty() {
            return Err(SmsError::MissingInput);
        }

        let to = to_e164(to, &self.config.country_code);
        let res = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            let message: TwilioMessage = res.json().await?;
            debug!("Twilio accepted message {}", message.sid);
            Ok(message.sid)
        } else {
            let text = res.text().await?;
            let reason = serde_json::from_str::<TwilioErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            warn!("Twilio error ({}): {}", status, reason);
            Err(SmsError::Rejected(reason))
        }
    }
}

impl SmsGateway for TwilioGateway {
    fn send_sms<'a>(&'a self, to: &'a str, body: &'a str) -> BoxFuture<'a, Result<String, SmsError>> {
        Box::pin(self.send(to, body))
    }
}

/// Used when no gateway credentials are configured: every send fails.
pub struct DisabledGateway;

impl SmsGateway for DisabledGateway {
    fn send_sms<'a>(&'a self, _to: &'a str, _body: &'a str) -> BoxFuture<'a, Result<String, SmsError>> {
        Box::pin(async { Err(SmsError::NotConfigured) })
    }
}

fn to_e164(number: &str, country_code: &str) -> String {
    let number = number.trim();
    if number.starts_with('+') {
        number.to_string()
    } else {
        format!("{}{}", country_code, number)
    }
}
