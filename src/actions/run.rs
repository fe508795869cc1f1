use super::base::{Credentials, QueryBuilder, ResponseState};
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use serde::Deserialize;

const ACTION: &str = "RUN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Execution job, e.g. `P-504.1463`.
    pub job: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunPayload {
    job: String,
}

impl TryFrom<RunPayload> for RunResult {
    type Error = SdkError;

    fn try_from(raw: RunPayload) -> Result<Self, SdkError> {
        if raw.job.trim().is_empty() {
            return Err(SdkError::response_format("RUN response has an empty Job"));
        }
        Ok(Self { job: raw.job })
    }
}

/// Starts processing of a prepared input file.
#[derive(Debug, Clone)]
pub struct RunAction {
    credentials: Credentials,
    job: String,
    rto: String,
    input_file: String,
    calibration_file: Option<String>,
    state: ResponseState<RunResult>,
}

impl RunAction {
    pub fn new(
        user: impl Into<String>,
        code: impl Into<String>,
        job: impl Into<String>,
        rto: impl Into<String>,
        input_file: impl Into<String>,
        calibration_file: Option<String>,
    ) -> Self {
        Self::with_credentials(
            Credentials::new(user, code),
            job,
            rto,
            input_file,
            calibration_file,
        )
    }

    pub fn with_credentials(
        credentials: Credentials,
        job: impl Into<String>,
        rto: impl Into<String>,
        input_file: impl Into<String>,
        calibration_file: Option<String>,
    ) -> Self {
        Self {
            credentials,
            job: job.into(),
            rto: rto.into(),
            input_file: input_file.into(),
            calibration_file: calibration_file.filter(|name| !name.trim().is_empty()),
            state: ResponseState::default(),
        }
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.state.parsed()
    }

    pub fn job(&self) -> Option<&str> {
        self.result().map(|r| r.job.as_str())
    }
}

impl Action for RunAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        for (label, value) in [
            ("job", &self.job),
            ("RTO", &self.rto),
            ("input file", &self.input_file),
        ] {
            if value.trim().is_empty() {
                return Err(SdkError::configuration(format!("RUN requires a {}", label)));
            }
        }
        QueryBuilder::new(&self.credentials, ACTION)
            .push("Job", &self.job)
            .push("RTO", &self.rto)
            .push("InputFile", &self.input_file)
            .push_opt("CalibrationFile", self.calibration_file.as_deref())
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<RunPayload>(response, ACTION)
    }

    forward_response_state!();
}
