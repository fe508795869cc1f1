use super::base::{lenient_u64, Credentials, QueryBuilder, ResponseState};
use super::fingerprints::SftpFingerprints;
use super::{forward_response_state, Action};
use crate::constants::network::SFTP_DEFAULT_PORT;
use crate::errors::SdkError;
use serde::Deserialize;

const ACTION: &str = "SFTP";

/// Connection parameters for the account's SFTP drop box.
#[derive(Clone, PartialEq, Eq)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub directory: String,
    pub fingerprints: SftpFingerprints,
}

impl std::fmt::Debug for SftpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("directory", &self.directory)
            .field("fingerprints", &self.fingerprints)
            .finish()
    }
}

/// Anything that can hand out SFTP connection parameters, typically a
/// completed [`SftpAction`].
pub trait SftpConnectionSource {
    fn sftp_settings(&self) -> Result<&SftpSettings, SdkError>;
}

impl SftpConnectionSource for SftpSettings {
    fn sftp_settings(&self) -> Result<&SftpSettings, SdkError> {
        Ok(self)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SftpPayload {
    host: String,
    #[serde(default = "default_port", deserialize_with = "lenient_u64")]
    port: u64,
    #[serde(default)]
    directory: String,
    login: String,
    password: String,
    #[serde(default)]
    fingerprints: Vec<FingerprintEntry>,
}

fn default_port() -> u64 {
    u64::from(SFTP_DEFAULT_PORT)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FingerprintEntry {
    signature: String,
    algorithm: String,
    hash: String,
}

impl TryFrom<SftpPayload> for SftpSettings {
    type Error = SdkError;

    fn try_from(raw: SftpPayload) -> Result<Self, SdkError> {
        let port = u16::try_from(raw.port)
            .map_err(|_| SdkError::response_format(format!("Invalid SFTP port: {}", raw.port)))?;
        let fingerprints = raw
            .fingerprints
            .into_iter()
            .map(|entry| {
                let label = format!(
                    "{}-{}",
                    entry.signature.trim().to_uppercase(),
                    entry.algorithm.trim().to_uppercase()
                );
                (label, entry.hash)
            })
            .collect();
        Ok(Self {
            host: raw.host,
            port,
            username: raw.login,
            password: raw.password,
            directory: raw.directory,
            fingerprints,
        })
    }
}

/// Requests SFTP credentials for an account.
#[derive(Debug, Clone)]
pub struct SftpAction {
    credentials: Credentials,
    project_id: u64,
    state: ResponseState<SftpSettings>,
}

impl SftpAction {
    pub fn new(user: impl Into<String>, code: impl Into<String>, project_id: u64) -> Self {
        Self::with_credentials(Credentials::new(user, code), project_id)
    }

    pub fn with_credentials(credentials: Credentials, project_id: u64) -> Self {
        Self {
            credentials,
            project_id,
            state: ResponseState::default(),
        }
    }

    pub fn settings(&self) -> Option<&SftpSettings> {
        self.state.parsed()
    }

    pub fn host(&self) -> Option<&str> {
        self.settings().map(|s| s.host.as_str())
    }

    pub fn port(&self) -> Option<u16> {
        self.settings().map(|s| s.port)
    }

    pub fn sftp_username(&self) -> Option<&str> {
        self.settings().map(|s| s.username.as_str())
    }

    pub fn sftp_password(&self) -> Option<&str> {
        self.settings().map(|s| s.password.as_str())
    }

    pub fn directory(&self) -> Option<&str> {
        self.settings().map(|s| s.directory.as_str())
    }

    pub fn fingerprints(&self) -> Option<&SftpFingerprints> {
        self.settings().map(|s| &s.fingerprints)
    }
}

impl SftpConnectionSource for SftpAction {
    fn sftp_settings(&self) -> Result<&SftpSettings, SdkError> {
        self.settings().ok_or_else(|| {
            let err = SdkError::configuration("SFTP action has no connection parameters");
            match self.state.error() {
                Some(remote) => err.with_hint(format!("Service reported: {}", remote)),
                None => err.with_hint("Execute the SFTP action before transferring files."),
            }
        })
    }
}

impl Action for SftpAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        QueryBuilder::new(&self.credentials, ACTION)
            .push("ID", self.project_id)
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<SftpPayload>(response, ACTION)
    }

    forward_response_state!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_port_falls_back_to_ssh_default() {
        let mut action = SftpAction::new("user", "password", 100);
        action
            .process_response(
                r#"{"Action":"SFTP","Host":"sftp.example.com","Directory":"/files","Login":"Vt504","Password":"secret","Fingerprints":[]}"#,
            )
            .expect("parse");
        assert_eq!(action.port(), Some(22));
        assert!(action.fingerprints().map(SftpFingerprints::is_empty).unwrap_or(false));
    }

    #[test]
    fn unexecuted_action_has_no_connection_source() {
        let action = SftpAction::new("user", "password", 100);
        let err = action.sftp_settings().expect_err("pending");
        assert_eq!(err.kind, crate::errors::SdkErrorKind::Configuration);
    }
}
