use std::time::Duration;

use serde::Deserialize;

use super::{EmailError, EmailProvider, OutgoingEmail};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// Client for the Resend `POST /emails` endpoint.
#[derive(Clone)]
pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl EmailProvider for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_default();
        tracing::debug!(message_id = %id, to = %email.to, "Email accepted by provider");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "Reminders <onboarding@resend.dev>".into(),
            to: "someone@example.com".into(),
            subject: "Reminder: stretch".into(),
            html: "<p>stretch</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_json_with_bearer_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test_key"))
            .and(body_json(json!({
                "from": "Reminders <onboarding@resend.dev>",
                "to": "someone@example.com",
                "subject": "Reminder: stretch",
                "html": "<p>stretch</p>"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email_123"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client =
            ResendClient::new("re_test_key", mock_server.uri(), Duration::from_secs(5)).unwrap();

        assert!(client.send(&email()).await.is_ok());
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid recipient"))
            .mount(&mock_server)
            .await;

        let client =
            ResendClient::new("re_test_key", format!("{}/", mock_server.uri()), Duration::from_secs(5))
                .unwrap();

        match client.send(&email()).await {
            Err(EmailError::Rejected { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "invalid recipient");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client =
            ResendClient::new("re_test_key", mock_server.uri(), Duration::from_millis(200))
                .unwrap();

        assert!(matches!(
            client.send(&email()).await,
            Err(EmailError::Transport(_))
        ));
    }
}
