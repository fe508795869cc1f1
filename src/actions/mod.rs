//! Request/response messages of the PeakInvestigator API.
//!
//! Every action serializes itself into the `&`-joined query the service
//! expects and parses the matching JSON response. A response carrying
//! `Error`/`Message` is recorded on the action as a [`RemoteError`]; a
//! payload that cannot be understood at all is returned as an
//! [`SdkError`] of kind `ResponseFormat`.

mod base;
mod costs;
mod delete;
mod fingerprints;
mod init;
mod prep;
mod run;
mod sandbox;
mod sftp;
mod status;
mod versions;

use crate::errors::{RemoteError, SdkError};

pub use base::Credentials;
pub use costs::{rto_hours, ResponseTimeCosts};
pub use delete::{DeleteAction, DeleteResult};
pub use fingerprints::SftpFingerprints;
pub use init::{InitAction, InitBuilder, InitResult};
pub use prep::{PrepAction, PrepResult, PrepStatus};
pub use run::{RunAction, RunResult};
pub use sandbox::SandboxAction;
pub use sftp::{SftpAction, SftpConnectionSource, SftpSettings};
pub use status::{JobCompletion, JobStatus, StatusAction, StatusResult};
pub use versions::{PiVersionsAction, VersionsResult};

pub trait Action: Send {
    /// Name sent as `Action=` and echoed back by the service.
    fn action_name(&self) -> &'static str;

    fn build_query(&self) -> Result<String, SdkError>;

    fn process_response(&mut self, response: &str) -> Result<(), SdkError>;

    /// Drops any parsed result or remote error; request parameters stay.
    fn reset(&mut self);

    /// True once a successful (non-error) response has been processed.
    fn is_ready(&self) -> bool;

    fn remote_error(&self) -> Option<&RemoteError>;

    fn error_code(&self) -> i64 {
        self.remote_error().map(|err| err.code).unwrap_or(0)
    }

    fn error_message(&self) -> &str {
        self.remote_error()
            .map(|err| err.message.as_str())
            .unwrap_or_default()
    }
}

/// Implements the state-forwarding half of [`Action`] for a variant that
/// keeps its outcome in a `state: ResponseState<_>` field.
macro_rules! forward_response_state {
    () => {
        fn reset(&mut self) {
            self.state.reset();
        }

        fn is_ready(&self) -> bool {
            self.state.is_ready()
        }

        fn remote_error(&self) -> Option<&$crate::errors::RemoteError> {
            self.state.error()
        }
    };
}

pub(crate) use forward_response_state;
