use super::base::{Credentials, QueryBuilder, ResponseState};
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use serde::Deserialize;

const ACTION: &str = "PI_VERSIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionsResult {
    pub current: String,
    /// Empty when the account has never run a job.
    pub last_used: String,
    pub versions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionsPayload {
    current: String,
    #[serde(default)]
    last_used: Option<String>,
    versions: Vec<String>,
}

impl TryFrom<VersionsPayload> for VersionsResult {
    type Error = SdkError;

    fn try_from(raw: VersionsPayload) -> Result<Self, SdkError> {
        Ok(Self {
            current: raw.current,
            last_used: raw.last_used.unwrap_or_default(),
            versions: raw.versions,
        })
    }
}

/// Lists the PeakInvestigator versions the service can run.
#[derive(Debug, Clone)]
pub struct PiVersionsAction {
    credentials: Credentials,
    state: ResponseState<VersionsResult>,
}

impl PiVersionsAction {
    pub fn new(user: impl Into<String>, code: impl Into<String>) -> Self {
        Self::with_credentials(Credentials::new(user, code))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: ResponseState::default(),
        }
    }

    pub fn result(&self) -> Option<&VersionsResult> {
        self.state.parsed()
    }

    pub fn current_version(&self) -> Option<&str> {
        self.result().map(|r| r.current.as_str())
    }

    pub fn last_used_version(&self) -> Option<&str> {
        self.result().map(|r| r.last_used.as_str())
    }

    pub fn versions(&self) -> Option<&[String]> {
        self.result().map(|r| r.versions.as_slice())
    }
}

impl Action for PiVersionsAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        QueryBuilder::new(&self.credentials, ACTION).finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<VersionsPayload>(response, ACTION)
    }

    forward_response_state!();
}
