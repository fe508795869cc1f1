use super::base::{lenient_f64, Credentials, QueryBuilder, ResponseState};
use super::costs::ResponseTimeCosts;
use super::{forward_response_state, Action};
use crate::errors::SdkError;
use serde::Deserialize;
use std::collections::HashMap;

const ACTION: &str = "INIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MassRange {
    min: u32,
    max: u32,
    start: u32,
    end: u32,
}

/// Validated request parameters of an [`InitAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct InitConfig {
    project_id: u64,
    pi_version: Option<String>,
    scan_count: u32,
    calibration_count: u32,
    max_points: u32,
    mass: MassRange,
    client_key: String,
}

/// Collects job parameters before producing an [`InitAction`].
#[derive(Debug, Clone)]
pub struct InitBuilder {
    credentials: Credentials,
    client_key: String,
    project_id: Option<u64>,
    pi_version: Option<String>,
    scan_count: Option<(u32, u32)>,
    max_points: Option<u32>,
    mass: Option<MassRange>,
}

impl InitBuilder {
    pub fn with_mass_range(mut self, min: u32, max: u32, start: u32, end: u32) -> Self {
        self.mass = Some(MassRange {
            min,
            max,
            start,
            end,
        });
        self
    }

    pub fn using_project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_pi_version(mut self, version: impl Into<String>) -> Self {
        self.pi_version = Some(version.into());
        self
    }

    pub fn with_scan_count(mut self, scan_count: u32, calibration_count: u32) -> Self {
        self.scan_count = Some((scan_count, calibration_count));
        self
    }

    pub fn with_number_of_points(mut self, max_points: u32) -> Self {
        self.max_points = Some(max_points);
        self
    }

    /// Fails with a configuration error when a required parameter is
    /// missing or the mass range is inconsistent.
    pub fn build(self) -> Result<InitAction, SdkError> {
        let project_id = self
            .project_id
            .ok_or_else(|| SdkError::configuration("INIT requires a project id"))?;
        let (scan_count, calibration_count) = self
            .scan_count
            .ok_or_else(|| SdkError::configuration("INIT requires a scan count"))?;
        let max_points = self
            .max_points
            .ok_or_else(|| SdkError::configuration("INIT requires a maximum number of points"))?;
        let mass = self
            .mass
            .ok_or_else(|| SdkError::configuration("INIT requires a mass range"))?;
        if !(mass.min <= mass.start && mass.start <= mass.end && mass.end <= mass.max) {
            return Err(SdkError::configuration(format!(
                "Mass range is inconsistent: min={} start={} end={} max={}",
                mass.min, mass.start, mass.end, mass.max
            ))
            .with_hint("Expected min <= start <= end <= max."));
        }
        if self.client_key.trim().is_empty() {
            return Err(SdkError::configuration("INIT requires a client key"));
        }
        if let Some(version) = self.pi_version.as_deref() {
            if version.trim().is_empty() {
                return Err(SdkError::configuration("PI version must not be empty"));
            }
        }

        Ok(InitAction {
            credentials: self.credentials,
            config: InitConfig {
                project_id,
                pi_version: self.pi_version,
                scan_count,
                calibration_count,
                max_points,
                mass,
                client_key: self.client_key,
            },
            state: ResponseState::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitResult {
    pub job: String,
    /// Account number taken from the job prefix (`V-504.1551` -> 504).
    pub id: u64,
    pub funds: f64,
    pub estimated_costs: HashMap<String, ResponseTimeCosts>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitPayload {
    job: String,
    #[serde(deserialize_with = "lenient_f64")]
    funds: f64,
    #[serde(default)]
    estimated_cost: Vec<CostEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostEntry {
    instrument: String,
    #[serde(rename = "RTO")]
    rto: String,
    #[serde(deserialize_with = "lenient_f64")]
    cost: f64,
}

impl TryFrom<InitPayload> for InitResult {
    type Error = SdkError;

    fn try_from(raw: InitPayload) -> Result<Self, SdkError> {
        let id = account_id_from_job(&raw.job)?;

        let mut grouped: HashMap<String, Vec<(String, f64)>> = HashMap::new();
        for entry in raw.estimated_cost {
            grouped
                .entry(entry.instrument)
                .or_default()
                .push((entry.rto.trim().to_string(), entry.cost));
        }
        let estimated_costs = grouped
            .into_iter()
            .map(|(instrument, tiers)| (instrument, tiers.into_iter().collect()))
            .collect();

        Ok(Self {
            job: raw.job,
            id,
            funds: raw.funds,
            estimated_costs,
        })
    }
}

/// Extracts the account number from identifiers shaped `X-<account>.<seq>`.
pub(crate) fn account_id_from_job(job: &str) -> Result<u64, SdkError> {
    let invalid = || SdkError::response_format(format!("Unexpected job identifier: {}", job));
    let (_, rest) = job.split_once('-').ok_or_else(invalid)?;
    let (account, _) = rest.split_once('.').ok_or_else(invalid)?;
    account.parse::<u64>().map_err(|_| invalid())
}

/// Registers a job and asks the service for cost estimates.
#[derive(Debug, Clone)]
pub struct InitAction {
    credentials: Credentials,
    config: InitConfig,
    state: ResponseState<InitResult>,
}

impl InitAction {
    pub fn create(
        user: impl Into<String>,
        code: impl Into<String>,
        client_key: impl Into<String>,
    ) -> InitBuilder {
        Self::builder(Credentials::new(user, code), client_key)
    }

    pub fn builder(credentials: Credentials, client_key: impl Into<String>) -> InitBuilder {
        InitBuilder {
            credentials,
            client_key: client_key.into(),
            project_id: None,
            pi_version: None,
            scan_count: None,
            max_points: None,
            mass: None,
        }
    }

    pub fn result(&self) -> Option<&InitResult> {
        self.state.parsed()
    }

    pub fn job(&self) -> Option<&str> {
        self.result().map(|r| r.job.as_str())
    }

    pub fn id(&self) -> Option<u64> {
        self.result().map(|r| r.id)
    }

    pub fn funds(&self) -> Option<f64> {
        self.result().map(|r| r.funds)
    }

    pub fn estimated_costs(&self) -> Option<&HashMap<String, ResponseTimeCosts>> {
        self.result().map(|r| &r.estimated_costs)
    }
}

impl Action for InitAction {
    fn action_name(&self) -> &'static str {
        ACTION
    }

    fn build_query(&self) -> Result<String, SdkError> {
        let config = &self.config;
        QueryBuilder::new(&self.credentials, ACTION)
            .push("ID", config.project_id)
            .push_opt("PI_Version", config.pi_version.as_deref())
            .push("ScanCount", config.scan_count)
            .push("MaxPoints", config.max_points)
            .push("MinMass", config.mass.min)
            .push("MaxMass", config.mass.max)
            .push("StartMass", config.mass.start)
            .push("EndMass", config.mass.end)
            .push("CalibrationCount", config.calibration_count)
            .push("ClientKey", &config.client_key)
            .finish()
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.state.process::<InitPayload>(response, ACTION)
    }

    forward_response_state!();
}
