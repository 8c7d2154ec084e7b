//! services/api/src/adapters/mailer.rs
//!
//! This module contains the adapter for outbound email, implementing the
//! `Mailer` port against a JSON mail API. The port contract is send-or-fail:
//! this adapter never errors, it reports failure through its boolean return
//! and leaves the policy to the auth flow.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use notes_core::domain::Mail;
use notes_core::ports::Mailer;

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// An adapter that implements `Mailer` over an HTTP mail API.
#[derive(Clone)]
pub struct HttpMailerAdapter {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailerAdapter {
    /// Creates a new `HttpMailerAdapter`.
    pub fn new(http: reqwest::Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailerAdapter {
    async fn send(&self, mail: Mail) -> bool {
        let body = SendRequest {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html_body,
        };

        let result = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    status = %response.status(),
                    to = %mail.to,
                    "mail API rejected the send"
                );
                false
            }
            Err(e) => {
                warn!(to = %mail.to, "mail API request failed: {}", e);
                false
            }
        }
    }
}
