use super::base::{
    lenient_opt_f64, lenient_opt_u64, parse_datetime, Credentials, QueryBuilder, ResponseState,
};
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const ACTION: &str = "STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Preparing,
    Running,
    Done,
    Deleted,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Deleted)
    }
}

/// Figures reported once a job reaches `Done`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCompletion {
    pub input_scans: u64,
    pub complete_scans: u64,
    pub actual_cost: f64,
    pub results_file: String,
    pub log_file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
    pub job: String,
    pub status: JobStatus,
    pub datetime: NaiveDateTime,
    pub completion: Option<JobCompletion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatusPayload {
    job: String,
    status: JobStatus,
    datetime: String,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    scans_input: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    scans_complete: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    actual_cost: Option<f64>,
    #[serde(default)]
    results_file: Option<String>,
    #[serde(default)]
    job_log_file: Option<String>,
}

impl TryFrom<StatusPayload> for StatusResult {
    type Error = SdkError;

    fn try_from(raw: StatusPayload) -> Result<Self, SdkError> {
        let datetime = parse_datetime(&raw.datetime)?;
        let completion = if raw.status == JobStatus::Done {
            let missing =
                |field: &str| SdkError::response_format(format!("Done status lacks {}", field));
            Some(JobCompletion {
                input_scans: raw.scans_input.ok_or_else(|| missing("ScansInput"))?,
                complete_scans: raw.scans_complete.ok_or_else(|| missing("ScansComplete"))?,
                actual_cost: raw.actual_cost.ok_or_else(|| missing("ActualCost"))?,
                results_file: raw.results_file.ok_or_else(|| missing("ResultsFile"))?,
                log_file: raw.job_log_file.ok_or_else(|| missing("JobLogFile"))?,
            })
        } else {
            None
        };
        Ok(Self {
            job: raw.job,
            status: raw.status,
            datetime,
            completion,
        })
    }
}

/// Queries progress of a running job. One instance can be reused across
/// polls by calling [`Action::reset`] between responses.
#[derive(Debug, Clone)]
pub struct StatusAction {
    credentials: Credentials,
    job: String,
    state: ResponseState<StatusResult>,
}

impl StatusAction {
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

    pub fn result(&self) -> Option<&StatusResult> {
        self.state.parsed()
    }

    pub fn job(&self) -> Option<&str> {
        self.result().map(|r| r.job.as_str())
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.result().map(|r| r.status)
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.result().map(|r| r.datetime)
    }

    pub fn completion(&self) -> Option<&JobCompletion> {
        self.result().and_then(|r| r.completion.as_ref())
    }

    pub fn number_of_input_scans(&self) -> Option<u64> {
        self.completion().map(|c| c.input_scans)
    }

    pub fn number_of_complete_scans(&self) -> Option<u64> {
        self.completion().map(|c| c.complete_scans)
    }

    pub fn actual_cost(&self) -> Option<f64> {
        self.completion().map(|c| c.actual_cost)
    }

    pub fn results_filename(&self) -> Option<&str> {
        self.completion().map(|c| c.results_file.as_str())
    }

    pub fn log_filename(&self) -> Option<&str> {
        self.completion().map(|c| c.log_file.as_str())
    }
}

impl Action for StatusAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        if self.job.trim().is_empty() {
            return Err(SdkError::configuration("STATUS requires a job"));
        }
        QueryBuilder::new(&self.credentials, ACTION)
            .push("Job", &self.job)
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<StatusPayload>(response, ACTION)
    }

    forward_response_state!();
}
