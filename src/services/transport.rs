use crate::errors::SdkError;
use crate::services::config::SaasConfig;
use crate::services::logger::Logger;
use crate::utils::redact::{
    mask_inline_secrets, redact_query, redact_response_body, truncate_for_log,
};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::error::Error as _;
use url::Url;

const LOG_BODY_LENGTH: usize = 200;

/// "Send a query, get response text". Tests substitute their own.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, query: &str) -> Result<String, SdkError>;
}

/// POSTs queries to the service endpoint over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    logger: Logger,
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(logger: Logger, config: &SaasConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|err| {
                SdkError::configuration(format!("Failed to build HTTP client: {}", err))
            })?;
        Ok(Self {
            logger: logger.child("http"),
            client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, query: &str) -> Result<String, SdkError> {
        self.logger.debug(
            "send",
            Some(&serde_json::json!({
                "endpoint": self.endpoint.as_str(),
                "query": redact_query(query),
            })),
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(query.to_string())
            .send()
            .await
            .map_err(|err| map_reqwest_error(&self.endpoint, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::connection(format!(
                "Service returned HTTP {} for {}",
                status, self.endpoint
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(&self.endpoint, err))?;
        self.logger
            .debug("received", Some(&received_meta(status.as_u16(), &text)));
        check_response_text(text)
    }
}

/// Debug metadata for a received body; secrets never reach the log line.
fn received_meta(status: u16, body: &str) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "body": redact_response_body(body),
    })
}

/// Rejects bodies that cannot possibly be a JSON object response.
pub fn check_response_text(text: String) -> Result<String, SdkError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SdkError::bad_response("Service returned an empty response"));
    }
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return Err(SdkError::bad_response(format!(
            "Service returned a malformed response: {}",
            truncate_for_log(&mask_inline_secrets(trimmed), LOG_BODY_LENGTH)
        )));
    }
    Ok(text)
}

fn error_chain_text(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

pub(crate) fn looks_like_dns_failure(chain: &str) -> bool {
    let lowered = chain.to_lowercase();
    [
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "no such host",
        "nodename nor servname",
        "temporary failure in name resolution",
    ]
    .iter()
    .any(|needle| lowered.contains(needle))
}

fn map_reqwest_error(endpoint: &Url, err: reqwest::Error) -> SdkError {
    let host = endpoint.host_str().unwrap_or_default().to_string();
    if err.is_timeout() {
        return SdkError::timeout(format!("Request to {} timed out", host));
    }
    let chain = error_chain_text(&err);
    if err.is_connect() && looks_like_dns_failure(&chain) {
        return SdkError::unknown_host(format!("unknown host: {}", host));
    }
    if err.is_connect() {
        return SdkError::connection(format!("Failed to connect to {}: {}", host, chain));
    }
    if err.is_body() || err.is_decode() {
        return SdkError::bad_response(format!("Failed to read response from {}: {}", host, chain));
    }
    SdkError::connection(chain)
}

#[cfg(test)]
mod tests {
    use super::{check_response_text, looks_like_dns_failure, received_meta, HttpTransport, Transport};
    use crate::errors::SdkErrorKind;
    use crate::services::config::SaasConfig;
    use crate::services::logger::Logger;
    use crate::utils::redact::redact_object;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SFTP_BODY: &str = r#"{"Action":"SFTP","Host":"peakinvestigator.veritomyx.com","Port":22022,"Directory":"/files","Login":"Vt504","Password":"0UtnWMvzoi2jF4BQ","Fingerprints":[{"Signature":"RSA","Algorithm":"MD5","Hash":"d2:be:b8:2e:3c:be:84:e4:a3:0a:c8:42:5c:6b:39:4e"}]}"#;

    fn local_transport(port: u16, timeout_ms: u64) -> HttpTransport {
        let config = SaasConfig::new(format!("http://127.0.0.1:{}", port))
            .with_timeout_ms(timeout_ms)
            .expect("timeout");
        HttpTransport::new(Logger::new("test"), &config).expect("transport")
    }

    #[test]
    fn received_log_hides_sftp_password() {
        let printed = redact_object(&received_meta(200, SFTP_BODY)).to_string();
        assert!(!printed.contains("0UtnWMvzoi2jF4BQ"), "{}", printed);
        assert!(printed.contains("Vt504"));
    }

    #[test]
    fn malformed_body_error_masks_secrets() {
        let cut = &SFTP_BODY[..SFTP_BODY.len() - 20];
        let err = check_response_text(cut.to_string()).expect_err("cut body");
        assert_eq!(err.kind, SdkErrorKind::BadResponse);
        assert!(!err.message.contains("0UtnWMvzoi2jF4BQ"));
    }

    #[tokio::test]
    async fn silent_server_is_a_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            drop(socket);
        });

        let err = local_transport(port, 200)
            .send("Version=3.0&Action=STATUS")
            .await
            .expect_err("timeout");
        assert_eq!(err.kind, SdkErrorKind::Timeout);
        server.abort();
    }

    #[tokio::test]
    async fn non_json_reply_is_a_bad_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = "service down";
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.expect("reply");
            let _ = socket.shutdown().await;
        });

        let err = local_transport(port, 5_000)
            .send("Version=3.0&Action=STATUS")
            .await
            .expect_err("bad body");
        assert_eq!(err.kind, SdkErrorKind::BadResponse);
        let _ = server.await;
    }

    #[tokio::test]
    async fn unresolvable_host_is_unknown_host() {
        let config = SaasConfig::new("http://peakinvestigator.invalid")
            .with_timeout_ms(10_000)
            .expect("timeout");
        let transport = HttpTransport::new(Logger::new("test"), &config).expect("transport");

        let err = transport
            .send("Version=3.0&Action=STATUS")
            .await
            .expect_err("dns");
        assert_eq!(err.kind, SdkErrorKind::UnknownHost);
        assert_eq!(err.message, "unknown host: peakinvestigator.invalid");
    }

    #[test]
    fn detects_resolver_failures() {
        assert!(looks_like_dns_failure(
            "error sending request: dns error: failed to lookup address information"
        ));
        assert!(!looks_like_dns_failure("connection refused"));
    }

    #[test]
    fn short_or_garbled_bodies_are_bad_responses() {
        let empty = check_response_text("  ".to_string()).expect_err("empty");
        assert_eq!(empty.kind, SdkErrorKind::BadResponse);

        let html = check_response_text("<html>502</html>".to_string()).expect_err("html");
        assert_eq!(html.kind, SdkErrorKind::BadResponse);

        let truncated = check_response_text("{\"Action\":\"RUN\"".to_string()).expect_err("cut");
        assert_eq!(truncated.kind, SdkErrorKind::BadResponse);

        assert!(check_response_text("{\"Action\":\"RUN\"}".to_string()).is_ok());
    }
}
