//! ## livlina-transport::telegram
//! **Bot-API notification channel**
//!
//! Speaks the Telegram Bot HTTP API:
//! - `POST {base}/bot{token}/sendMessage` with a JSON body
//! - `POST {base}/bot{token}/sendPhoto` with a multipart body
//! - `POST {base}/bot{token}/sendLocation` with a JSON body
//!
//! Any transport error, non-2xx status, timeout, or `ok: false` answer is
//! folded into [`ChannelError`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use livlina_core::channel::{Ack, ChannelError, NotificationChannel};
use livlina_core::report::Coordinates;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_PARSE_MODE: &str = "HTML";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Serialize)]
struct SendLocation<'a> {
    chat_id: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<MessageResult>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// Notification channel backed by a bot account.
#[derive(Clone)]
pub struct TelegramChannel {
    http: reqwest::Client,
    /// `{api_base}/bot{token}`; holds the secret, never logged.
    endpoint: String,
    parse_mode: String,
}

impl fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("endpoint", &"<redacted>")
            .field("parse_mode", &self.parse_mode)
            .finish()
    }
}

impl TelegramChannel {
    pub fn new(api_base: &str, bot_token: &str) -> Result<Self, ChannelError> {
        Self::with_timeout(api_base, bot_token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_base: &str,
        bot_token: &str,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
            parse_mode: DEFAULT_PARSE_MODE.to_string(),
        })
    }

    pub fn with_parse_mode(mut self, parse_mode: impl Into<String>) -> Self {
        self.parse_mode = parse_mode.into();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn read_ack(response: reqwest::Response) -> Result<Ack, ChannelError> {
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if !status.is_success() {
            let body = parsed.and_then(|r| r.description).unwrap_or(body);
            return Err(ChannelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match parsed {
            Some(ApiResponse { ok: true, result, .. }) => Ok(Ack {
                message_id: result.map(|r| r.message_id),
            }),
            Some(ApiResponse { description, .. }) => Err(ChannelError::Rejected(
                description.unwrap_or_else(|| "unknown error".to_string()),
            )),
            None => Err(ChannelError::Rejected(format!(
                "unreadable response: {body}"
            ))),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ChannelError {
    if e.is_timeout() {
        ChannelError::Timeout
    } else {
        // Strip the URL: it embeds the bot token.
        ChannelError::Transport(e.without_url().to_string())
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    #[instrument(skip_all, fields(len = message.len()))]
    async fn send_text(&self, recipient: &str, message: &str) -> Result<Ack, ChannelError> {
        let body = SendMessage {
            chat_id: recipient,
            text: message,
            parse_mode: &self.parse_mode,
        };
        let response = self
            .http
            .post(self.url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let ack = Self::read_ack(response).await?;
        debug!(message_id = ?ack.message_id, "Message accepted");
        Ok(ack)
    }

    #[instrument(skip_all, fields(len = bytes.len()))]
    async fn send_attachment(
        &self,
        recipient: &str,
        bytes: Bytes,
        caption: &str,
    ) -> Result<Ack, ChannelError> {
        let photo = Part::bytes(bytes.to_vec()).file_name("photo.jpg");
        let form = Form::new()
            .text("chat_id", recipient.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);
        let response = self
            .http
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_ack(response).await
    }

    async fn send_location(
        &self,
        recipient: &str,
        coordinates: Coordinates,
    ) -> Result<Ack, ChannelError> {
        let body = SendLocation {
            chat_id: recipient,
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
        };
        let response = self
            .http
            .post(self.url("sendLocation"))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_ack(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:abc";

    fn ok_body(id: i64) -> serde_json::Value {
        json!({ "ok": true, "result": { "message_id": id } })
    }

    async fn channel(server: &MockServer) -> TelegramChannel {
        TelegramChannel::new(&server.uri(), TOKEN).unwrap()
    }

    #[tokio::test]
    async fn send_text_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "-10042",
                "text": "hello",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(7)))
            .expect(1)
            .mount(&server)
            .await;

        let ack = channel(&server)
            .await
            .send_text("-10042", "hello")
            .await
            .unwrap();
        assert_eq!(ack.message_id, Some(7));
    }

    #[tokio::test]
    async fn send_photo_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendPhoto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(8)))
            .mount(&server)
            .await;

        channel(&server)
            .await
            .send_attachment("-10042", Bytes::from_static(b"\xFF\xD8\xFFjpegdata"), "Emergency situation photo")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"chat_id\""));
        assert!(body.contains("-10042"));
        assert!(body.contains("Emergency situation photo"));
        assert!(body.contains("jpegdata"));
    }

    #[tokio::test]
    async fn send_location_posts_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendLocation"))
            .and(body_json(json!({
                "chat_id": "-10042",
                "latitude": 12.97,
                "longitude": 77.59
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(9)))
            .expect(1)
            .mount(&server)
            .await;

        let coordinates = Coordinates::new(12.97, 77.59).unwrap();
        channel(&server)
            .await
            .send_location("-10042", coordinates)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = channel(&server)
            .await
            .send_text("-1", "hello")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChannelError::Status {
                status: 400,
                body: "Bad Request: chat not found".into()
            }
        );
    }

    #[tokio::test]
    async fn ok_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "description": "flood control" })),
            )
            .mount(&server)
            .await;

        let err = channel(&server)
            .await
            .send_text("-1", "hello")
            .await
            .unwrap_err();
        assert_eq!(err, ChannelError::Rejected("flood control".into()));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body(1))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let channel =
            TelegramChannel::with_timeout(&server.uri(), TOKEN, Duration::from_millis(100))
                .unwrap();
        let err = channel.send_text("-1", "hello").await.unwrap_err();
        assert_eq!(err, ChannelError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let channel = TelegramChannel::new("http://127.0.0.1:9", TOKEN).unwrap();
        let err = channel.send_text("-1", "hello").await.unwrap_err();
        match err {
            ChannelError::Transport(msg) => assert!(!msg.contains(TOKEN)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_token() {
        let channel = TelegramChannel::new(DEFAULT_API_BASE, TOKEN).unwrap();
        assert!(!format!("{channel:?}").contains(TOKEN));
    }
}
