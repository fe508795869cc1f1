use super::base::{parse_datetime, Credentials, QueryBuilder, ResponseState};
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use chrono::NaiveDateTime;
use serde::Deserialize;

const ACTION: &str = "DELETE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub job: String,
    pub datetime: NaiveDateTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeletePayload {
    job: String,
    datetime: String,
}

impl TryFrom<DeletePayload> for DeleteResult {
    type Error = SdkError;

    fn try_from(raw: DeletePayload) -> Result<Self, SdkError> {
        Ok(Self {
            datetime: parse_datetime(&raw.datetime)?,
            job: raw.job,
        })
    }
}

/// Removes a job and its files from the service.
#[derive(Debug, Clone)]
pub struct DeleteAction {
    credentials: Credentials,
    job: String,
    state: ResponseState<DeleteResult>,
}

impl DeleteAction {
    pub fn new(user: impl Into<String>, code: impl Into<String>, job: impl Into<String>) -> Self {
        Self::with_credentials(Credentials::new(user, code), job)
    }

    pub fn with_credentials(credentials: Credentials, job: impl Into<String>) -> Self {
        Self {
            credentials,
            job: job.into(),
            state: ResponseState::default(),
        }
    }

    pub fn result(&self) -> Option<&DeleteResult> {
        self.state.parsed()
    }

    pub fn job(&self) -> Option<&str> {
        self.result().map(|r| r.job.as_str())
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.result().map(|r| r.datetime)
    }
}

impl Action for DeleteAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        if self.job.trim().is_empty() {
            return Err(SdkError::configuration("DELETE requires a job"));
        }
        QueryBuilder::new(&self.credentials, ACTION)
            .push("Job", &self.job)
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<DeletePayload>(response, ACTION)
    }

    forward_response_state!();
}
