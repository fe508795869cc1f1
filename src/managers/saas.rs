use crate::actions::{Action, SftpConnectionSource};
use crate::errors::SdkError;
use crate::managers::sftp::{
    ProgressMonitor, SftpBackend, SftpSessionManager, Ssh2Backend, TransferSummary,
};
use crate::services::config::SaasConfig;
use crate::services::logger::Logger;
use crate::services::transport::{HttpTransport, Transport};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Entry point to the PeakInvestigator service: sends actions over the
/// configured [`Transport`] and moves files over SFTP.
///
/// Nothing here retries. Callers that want to poll or back off layer that
/// on top, see [`crate::managers::polling`].
pub struct PeakInvestigatorSaaS {
    logger: Logger,
    config: SaasConfig,
    transport: Arc<dyn Transport>,
    sftp: SftpSessionManager,
}

impl PeakInvestigatorSaaS {
    /// HTTPS transport and libssh2 SFTP against `server`.
    pub fn new(server: impl Into<String>) -> Result<Self, SdkError> {
        Self::from_config(SaasConfig::new(server))
    }

    pub fn from_config(config: SaasConfig) -> Result<Self, SdkError> {
        let logger = Logger::new("peakinvestigator");
        let transport = Arc::new(HttpTransport::new(logger.clone(), &config)?);
        let backend = Arc::new(Ssh2Backend::new(logger.clone()));
        Ok(Self::with_parts(logger, config, transport, backend))
    }

    /// Wires explicit collaborators; used by tests and embedders.
    pub fn with_parts(
        logger: Logger,
        config: SaasConfig,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn SftpBackend>,
    ) -> Self {
        let sftp = SftpSessionManager::new(logger.clone(), backend, config.sftp_timeout());
        Self {
            logger: logger.child("saas"),
            config,
            transport,
            sftp,
        }
    }

    /// Rebuilds the HTTP transport with a new timeout; SFTP follows suit.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Result<Self, SdkError> {
        self.config = self.config.clone().with_timeout_ms(timeout_ms)?;
        self.transport = Arc::new(HttpTransport::new(self.logger.clone(), &self.config)?);
        self.sftp = self
            .sftp
            .with_timeout(Duration::from_millis(self.config.sftp_timeout_ms));
        Ok(self)
    }

    pub fn config(&self) -> &SaasConfig {
        &self.config
    }

    pub fn sftp(&self) -> &SftpSessionManager {
        &self.sftp
    }

    /// Sends `action` and feeds the response back into it. Returns the raw
    /// response text. A remote-reported error is not an `Err` here; inspect
    /// `action.remote_error()`.
    pub async fn execute_action(&self, action: &mut dyn Action) -> Result<String, SdkError> {
        let query = action.build_query()?;
        let name = action.action_name();
        self.logger
            .debug("execute", Some(&serde_json::json!({"action": name})));

        let response = match self.transport.send(&query).await {
            Ok(text) => text,
            Err(err) => {
                self.logger.warn(
                    "transport failure",
                    Some(&serde_json::json!({"action": name, "kind": err.kind, "error": err.message})),
                );
                return Err(err);
            }
        };

        action.process_response(&response)?;
        if let Some(remote) = action.remote_error() {
            self.logger.warn(
                "service reported an error",
                Some(&serde_json::json!({
                    "action": name,
                    "code": remote.code,
                    "message": remote.message,
                    "location": remote.location,
                })),
            );
        }
        Ok(response)
    }

    pub fn initialize_sftp_session(
        &self,
        host: &str,
        username: &str,
        password: &str,
        port: u16,
        fingerprint: &str,
    ) -> Result<(), SdkError> {
        self.sftp
            .initialize(host, username, password, port, fingerprint)
    }

    pub fn is_connected_for_sftp(&self) -> bool {
        self.sftp.is_connected()
    }

    pub fn disconnect_sftp(&self) {
        self.sftp.disconnect();
    }

    /// Blocking; wrap in `spawn_blocking` from async code.
    pub fn put_file(
        &self,
        source: &dyn SftpConnectionSource,
        remote_name: &str,
        local_path: &Path,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<TransferSummary, SdkError> {
        self.sftp.put_file(source, remote_name, local_path, monitor)
    }

    /// Blocking; wrap in `spawn_blocking` from async code.
    pub fn get_file(
        &self,
        source: &dyn SftpConnectionSource,
        remote_name: &str,
        local_path: &Path,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<TransferSummary, SdkError> {
        self.sftp.get_file(source, remote_name, local_path, monitor)
    }
}
