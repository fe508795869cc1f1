use crate::constants::network::{TIMEOUT_API_REQUEST_MS, TIMEOUT_SFTP_MS, USER_AGENT};
use crate::constants::protocol::{API_PATH, DEFAULT_SERVER};
use crate::constants::protocols::ALLOWED_HTTP;
use crate::errors::SdkError;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaasConfig {
    /// Bare host name or full URL of the service.
    pub server: String,
    pub timeout_ms: u64,
    pub sftp_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for SaasConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout_ms: TIMEOUT_API_REQUEST_MS,
            sftp_timeout_ms: TIMEOUT_SFTP_MS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl SaasConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// Reads `PI_SERVER`, `PI_TIMEOUT_MS` and `PI_SFTP_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let server = std::env::var("PI_SERVER")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.server);
        Self {
            server,
            timeout_ms: read_positive_ms("PI_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            sftp_timeout_ms: read_positive_ms("PI_SFTP_TIMEOUT_MS")
                .unwrap_or(defaults.sftp_timeout_ms),
            user_agent: defaults.user_agent,
        }
    }

    /// Sets both the HTTP and the SFTP timeout. Zero is rejected.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, SdkError> {
        ensure_positive_ms("timeout_ms", timeout_ms)?;
        self.timeout_ms = timeout_ms;
        self.sftp_timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SdkError> {
        ensure_positive_ms("timeout_ms", self.timeout_ms)?;
        ensure_positive_ms("sftp_timeout_ms", self.sftp_timeout_ms)?;
        self.endpoint().map(|_| ())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sftp_timeout(&self) -> Duration {
        Duration::from_millis(self.sftp_timeout_ms)
    }

    /// Full API URL: a bare host becomes `https://<host>/api/`.
    pub fn endpoint(&self) -> Result<Url, SdkError> {
        normalize_endpoint(&self.server)
    }
}

fn ensure_positive_ms(name: &str, value: u64) -> Result<(), SdkError> {
    if value == 0 {
        return Err(SdkError::configuration(format!("{} must be greater than zero", name)));
    }
    Ok(())
}

fn read_positive_ms(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

pub fn normalize_endpoint(server: &str) -> Result<Url, SdkError> {
    let trimmed = server.trim();
    if trimmed.is_empty() {
        return Err(SdkError::configuration("Server must be a non-empty host or URL"));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let mut url = Url::parse(&candidate).map_err(|err| {
        SdkError::configuration(format!("Invalid server {:?}: {}", server, err))
    })?;
    if !ALLOWED_HTTP.contains(&url.scheme()) {
        return Err(SdkError::configuration(format!(
            "Unsupported scheme {} for server {}",
            url.scheme(),
            server
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(SdkError::configuration(format!("Server {:?} has no host", server)));
    }
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(API_PATH);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::{normalize_endpoint, SaasConfig};
    use crate::errors::SdkErrorKind;

    #[test]
    fn bare_host_gets_https_and_api_path() {
        let url = normalize_endpoint("peakinvestigator.veritomyx.com").expect("url");
        assert_eq!(url.as_str(), "https://peakinvestigator.veritomyx.com/api/");
    }

    #[test]
    fn explicit_scheme_and_path_are_kept() {
        let url = normalize_endpoint("http://localhost:8080/custom/").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/custom/");
    }

    #[test]
    fn zero_timeouts_are_configuration_errors() {
        let err = SaasConfig::new("example.com")
            .with_timeout_ms(0)
            .expect_err("zero");
        assert_eq!(err.kind, SdkErrorKind::Configuration);

        let config = SaasConfig {
            sftp_timeout_ms: 0,
            ..SaasConfig::new("example.com")
        };
        assert_eq!(config.validate().expect_err("zero sftp").kind, SdkErrorKind::Configuration);

        let config = SaasConfig::new("example.com").with_timeout_ms(250).expect("positive");
        assert_eq!(config.sftp_timeout_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(normalize_endpoint("ftp://example.com").is_err());
        assert!(normalize_endpoint("  ").is_err());
    }
}
