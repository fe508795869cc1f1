//! Caller-side polling on top of [`PeakInvestigatorSaaS::execute_action`].

use crate::actions::Action;
use crate::constants::polling::{DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS};
use crate::errors::SdkError;
use crate::managers::saas::PeakInvestigatorSaaS;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: usize,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// `done` returned true; the action holds the final response.
    Completed { attempts: usize },
    /// The service reported an error; see `action.remote_error()`.
    RemoteError { attempts: usize },
}

/// Re-executes `action` (resetting it between attempts) until `done`
/// accepts the parsed result or the service reports an error.
pub async fn poll_until<A, F>(
    saas: &PeakInvestigatorSaaS,
    action: &mut A,
    policy: PollPolicy,
    mut done: F,
) -> Result<PollOutcome, SdkError>
where
    A: Action,
    F: FnMut(&A) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.interval).await;
            action.reset();
        }
        saas.execute_action(action).await?;
        if action.remote_error().is_some() {
            return Ok(PollOutcome::RemoteError { attempts: attempt });
        }
        if done(action) {
            return Ok(PollOutcome::Completed { attempts: attempt });
        }
    }
    Err(SdkError::timeout(format!(
        "{} did not complete after {} attempts",
        action.action_name(),
        max_attempts
    ))
    .with_hint("Increase PollPolicy::max_attempts or the polling interval."))
}
