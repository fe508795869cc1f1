use super::base::{lenient_opt_u64, Credentials, QueryBuilder, ResponseState};
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use serde::{Deserialize, Serialize};

const ACTION: &str = "PREP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepStatus {
    Analyzing,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepResult {
    pub file: String,
    pub status: PrepStatus,
    /// Only reported while analyzing; empty otherwise.
    pub percent_complete: String,
    pub scan_count: u64,
    /// `TBD` until the analyzer type has been resolved.
    pub ms_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PrepPayload {
    #[serde(default)]
    file: String,
    status: PrepStatus,
    #[serde(default)]
    percent_complete: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    scan_count: Option<u64>,
    #[serde(default, rename = "MSType")]
    ms_type: Option<String>,
}

impl TryFrom<PrepPayload> for PrepResult {
    type Error = SdkError;

    fn try_from(raw: PrepPayload) -> Result<Self, SdkError> {
        let percent_complete = match raw.status {
            PrepStatus::Analyzing => raw.percent_complete.unwrap_or_default(),
            _ => String::new(),
        };
        Ok(Self {
            file: raw.file,
            status: raw.status,
            percent_complete,
            scan_count: raw.scan_count.unwrap_or(0),
            ms_type: raw.ms_type.unwrap_or_default(),
        })
    }
}

/// Polls the service while it inspects an uploaded input archive.
#[derive(Debug, Clone)]
pub struct PrepAction {
    credentials: Credentials,
    project_id: u64,
    filename: String,
    state: ResponseState<PrepResult>,
}

impl PrepAction {
    pub fn new(
        user: impl Into<String>,
        code: impl Into<String>,
        project_id: u64,
        filename: impl Into<String>,
    ) -> Self {
        Self::with_credentials(Credentials::new(user, code), project_id, filename)
    }

    pub fn with_credentials(
        credentials: Credentials,
        project_id: u64,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            project_id,
            filename: filename.into(),
            state: ResponseState::default(),
        }
    }

    pub fn result(&self) -> Option<&PrepResult> {
        self.state.parsed()
    }

    pub fn status(&self) -> Option<PrepStatus> {
        self.result().map(|r| r.status)
    }

    pub fn percent_complete(&self) -> Option<&str> {
        self.result().map(|r| r.percent_complete.as_str())
    }

    pub fn scan_count(&self) -> Option<u64> {
        self.result().map(|r| r.scan_count)
    }

    pub fn ms_type(&self) -> Option<&str> {
        self.result().map(|r| r.ms_type.as_str())
    }
}

impl Action for PrepAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        if self.filename.trim().is_empty() {
            return Err(SdkError::configuration("PREP requires an input filename"));
        }
        QueryBuilder::new(&self.credentials, ACTION)
            .push("ID", self.project_id)
            .push("File", &self.filename)
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<PrepPayload>(response, ACTION)
    }

    forward_response_state!();
}
