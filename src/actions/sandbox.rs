use super::sftp::{SftpConnectionSource, SftpSettings};
use super::Action;
use crate::constants::protocol::DEFAULT_SANDBOX;
use crate::errors::{RemoteError, SdkError};

/// Routes any action to a non-production environment by appending
/// `Sandbox=<n>` to its query. Parsing is left to the wrapped action.
#[derive(Debug, Clone)]
pub struct SandboxAction<A> {
    inner: A,
    sandbox: i32,
}

impl<A: Action> SandboxAction<A> {
    pub fn new(inner: A) -> Self {
        Self::with_sandbox(inner, DEFAULT_SANDBOX)
    }

    pub fn with_sandbox(inner: A, sandbox: i32) -> Self {
        Self { inner, sandbox }
    }

    pub fn sandbox(&self) -> i32 {
        self.sandbox
    }

    pub fn wrapped_action(&self) -> &A {
        &self.inner
    }

    pub fn wrapped_action_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: Action> Action for SandboxAction<A> {
    fn action_name(&self) -> &'static str {
        self.inner.action_name()
    }

    fn build_query(&self) -> Result<String, SdkError> {
        Ok(format!("{}&Sandbox={}", self.inner.build_query()?, self.sandbox))
    }

    fn process_response(&mut self, response: &str) -> Result<(), SdkError> {
        self.inner.process_response(response)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn remote_error(&self) -> Option<&RemoteError> {
        self.inner.remote_error()
    }
}

impl<A: SftpConnectionSource> SftpConnectionSource for SandboxAction<A> {
    fn sftp_settings(&self) -> Result<&SftpSettings, SdkError> {
        self.inner.sftp_settings()
    }
}
