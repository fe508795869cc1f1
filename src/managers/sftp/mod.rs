mod progress;
mod ssh2_backend;

pub use progress::{LoggingProgress, ProgressMonitor, SilentProgress, TransferDirection};
pub use ssh2_backend::Ssh2Backend;

use crate::actions::{SftpConnectionSource, SftpFingerprints};
use crate::constants::transfer::BUFFER_SIZE;
use crate::errors::SdkError;
use crate::services::logger::Logger;
use crate::utils::fingerprint::{detect_digest, fingerprints_match, FingerprintDigest};
use crate::utils::fs_atomic::{
    commit_partial, discard_partial, ensure_dir_for_file, partial_sibling_path,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Opens transport-level connections to an SFTP server.
pub trait SftpBackend: Send + Sync {
    fn open(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn SftpLink>, SdkError>;
}

/// One SSH connection: host key inspection happens before `authenticate`,
/// file access only after it.
pub trait SftpLink: Send {
    /// `RSA`, `DSA`, `ECDSA` or `ED25519`.
    fn host_key_type(&self) -> Option<String>;

    fn host_key_fingerprint(&self, digest: FingerprintDigest) -> Option<String>;

    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SdkError>;

    fn file_size(&mut self, path: &str) -> Result<u64, SdkError>;

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, SdkError>;

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, SdkError>;

    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SftpState {
    Disconnected,
    Connecting,
    Connected,
    Transferring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SftpSessionInfo {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub directory: String,
    pub fingerprint_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub direction: TransferDirection,
    pub source: String,
    pub destination: String,
    pub bytes: u64,
    /// Hex SHA-256 of the bytes moved.
    pub sha256: String,
}

/// What the presented host key must match.
enum HostIdentity<'a> {
    Fingerprint(&'a str),
    Published(&'a SftpFingerprints),
}

struct Slot {
    state: SftpState,
    info: Option<SftpSessionInfo>,
    link: Option<Box<dyn SftpLink>>,
}

impl Slot {
    fn disconnected() -> Self {
        Self {
            state: SftpState::Disconnected,
            info: None,
            link: None,
        }
    }
}

pub struct SftpSessionManager {
    logger: Logger,
    backend: Arc<dyn SftpBackend>,
    timeout: Duration,
    slot: Mutex<Slot>,
}

impl SftpSessionManager {
    pub fn new(logger: Logger, backend: Arc<dyn SftpBackend>, timeout: Duration) -> Self {
        Self {
            logger: logger.child("sftp"),
            backend,
            timeout,
            slot: Mutex::new(Slot::disconnected()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn state(&self) -> SftpState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            SftpState::Connected | SftpState::Transferring
        )
    }

    pub fn session_info(&self) -> Option<SftpSessionInfo> {
        self.lock().info.clone()
    }

    /// Connects, verifies the host key against `expected_fingerprint`
    /// (MD5 colon-hex or SHA256 base64) and authenticates. Any failure
    /// leaves the manager disconnected.
    pub fn initialize(
        &self,
        host: &str,
        username: &str,
        password: &str,
        port: u16,
        expected_fingerprint: &str,
    ) -> Result<(), SdkError> {
        self.disconnect();
        self.lock().state = SftpState::Connecting;

        match self.establish(
            host,
            port,
            username,
            password,
            HostIdentity::Fingerprint(expected_fingerprint),
        ) {
            Ok(link) => {
                let mut slot = self.lock();
                slot.state = SftpState::Connected;
                slot.info = Some(SftpSessionInfo {
                    host: host.to_string(),
                    port,
                    username: username.to_string(),
                    directory: String::new(),
                    fingerprint_verified: true,
                });
                slot.link = Some(link);
                Ok(())
            }
            Err(err) => {
                *self.lock() = Slot::disconnected();
                Err(err)
            }
        }
    }

    pub fn disconnect(&self) {
        let mut slot = self.lock();
        if let Some(mut link) = slot.link.take() {
            link.close();
            self.logger.debug("disconnected", None);
        }
        *slot = Slot::disconnected();
    }

    /// Uploads `local_path` into the account directory as `remote_name`.
    /// Connects, transfers and disconnects in one call.
    pub fn put_file(
        &self,
        source: &dyn SftpConnectionSource,
        remote_name: &str,
        local_path: &Path,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<TransferSummary, SdkError> {
        self.run_transfer(source, |link, directory| {
            let remote_path = join_remote(directory, remote_name);
            upload(link, local_path, &remote_path, monitor)
        })
    }

    /// Downloads `remote_name` from the account directory to `local_path`.
    /// Connects, transfers and disconnects in one call.
    pub fn get_file(
        &self,
        source: &dyn SftpConnectionSource,
        remote_name: &str,
        local_path: &Path,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<TransferSummary, SdkError> {
        self.run_transfer(source, |link, directory| {
            let remote_path = join_remote(directory, remote_name);
            download(link, &remote_path, local_path, monitor)
        })
    }

    fn run_transfer<F>(
        &self,
        source: &dyn SftpConnectionSource,
        transfer: F,
    ) -> Result<TransferSummary, SdkError>
    where
        F: FnOnce(&mut dyn SftpLink, &str) -> Result<TransferSummary, SdkError>,
    {
        let settings = source.sftp_settings()?;
        self.disconnect();
        self.lock().state = SftpState::Connecting;

        let mut link = match self.establish(
            &settings.host,
            settings.port,
            &settings.username,
            &settings.password,
            HostIdentity::Published(&settings.fingerprints),
        ) {
            Ok(link) => link,
            Err(err) => {
                *self.lock() = Slot::disconnected();
                return Err(err);
            }
        };

        {
            let mut slot = self.lock();
            slot.state = SftpState::Transferring;
            slot.info = Some(SftpSessionInfo {
                host: settings.host.clone(),
                port: settings.port,
                username: settings.username.clone(),
                directory: settings.directory.clone(),
                fingerprint_verified: true,
            });
        }

        let result = transfer(link.as_mut(), &settings.directory);
        link.close();
        *self.lock() = Slot::disconnected();

        match &result {
            Ok(summary) => self.logger.info(
                "transfer complete",
                Some(&serde_json::json!({
                    "direction": summary.direction,
                    "destination": summary.destination,
                    "bytes": summary.bytes,
                })),
            ),
            Err(err) => self.logger.warn(
                "transfer failed",
                Some(&serde_json::json!({"kind": err.kind, "error": err.message})),
            ),
        }
        result
    }

    fn establish(
        &self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        identity: HostIdentity<'_>,
    ) -> Result<Box<dyn SftpLink>, SdkError> {
        self.logger.debug(
            "connecting",
            Some(&serde_json::json!({"host": host, "port": port, "username": username})),
        );
        let mut link = self.backend.open(host, port, self.timeout)?;

        if let Err(err) = verify_host_key(link.as_ref(), &identity) {
            self.logger.error(
                "host key verification failed",
                Some(&serde_json::json!({"host": host, "port": port})),
            );
            link.close();
            return Err(err);
        }
        if let Err(err) = link.authenticate(username, password) {
            link.close();
            return Err(err);
        }
        Ok(link)
    }
}

fn verify_host_key(link: &dyn SftpLink, identity: &HostIdentity<'_>) -> Result<(), SdkError> {
    let (digest, expected) = match identity {
        HostIdentity::Fingerprint(expected) => (detect_digest(expected), expected.to_string()),
        HostIdentity::Published(table) => {
            let key_type = link.host_key_type().ok_or_else(|| {
                SdkError::identity("Server identity is not correct: unknown host key type")
            })?;
            [FingerprintDigest::Sha256, FingerprintDigest::Md5]
                .into_iter()
                .find_map(|digest| {
                    table
                        .for_key(&key_type, digest)
                        .map(|hash| (digest, hash.to_string()))
                })
                .ok_or_else(|| {
                    SdkError::identity(format!(
                        "Server identity is not correct: no published fingerprint for {} keys",
                        key_type
                    ))
                })?
        }
    };

    let observed = link.host_key_fingerprint(digest).unwrap_or_default();
    if !fingerprints_match(&expected, &observed) {
        return Err(SdkError::identity(format!(
            "Server identity is not correct (expected {}, got {})",
            expected,
            if observed.is_empty() {
                "unknown"
            } else {
                observed.as_str()
            }
        )));
    }
    Ok(())
}

fn join_remote(directory: &str, name: &str) -> String {
    let directory = directory.trim().trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Moves all bytes from `reader` to `writer`, reporting each chunk.
fn pump(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    monitor: &mut dyn ProgressMonitor,
) -> Result<(u64, String), SdkError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        hasher.update(&buf[..n]);
        total += n as u64;
        if !monitor.count(n as u64) {
            return Err(SdkError::cancelled(format!(
                "Transfer cancelled after {} bytes",
                total
            )));
        }
    }
    writer.flush()?;
    Ok((total, hex::encode(hasher.finalize())))
}

fn check_complete(expected: u64, moved: u64) -> Result<(), SdkError> {
    if expected != moved {
        return Err(SdkError::transfer(format!(
            "Transferred {} bytes but expected {}",
            moved, expected
        )));
    }
    Ok(())
}

fn upload(
    link: &mut dyn SftpLink,
    local_path: &Path,
    remote_path: &str,
    monitor: &mut dyn ProgressMonitor,
) -> Result<TransferSummary, SdkError> {
    let mut local_file = fs::File::open(local_path).map_err(|err| {
        SdkError::io(format!(
            "Local file {} must be readable: {}",
            local_path.display(),
            err
        ))
    })?;
    let size = local_file.metadata()?.len();
    let source = local_path.display().to_string();

    monitor.init(TransferDirection::Put, &source, remote_path, size);
    let outcome = link
        .open_write(remote_path)
        .and_then(|mut remote_file| pump(&mut local_file, remote_file.as_mut(), &mut *monitor));
    monitor.end();

    let (bytes, sha256) = outcome?;
    check_complete(size, bytes)?;
    Ok(TransferSummary {
        direction: TransferDirection::Put,
        source,
        destination: remote_path.to_string(),
        bytes,
        sha256,
    })
}

fn download(
    link: &mut dyn SftpLink,
    remote_path: &str,
    local_path: &Path,
    monitor: &mut dyn ProgressMonitor,
) -> Result<TransferSummary, SdkError> {
    let size = link.file_size(remote_path)?;
    let destination = local_path.display().to_string();
    ensure_dir_for_file(local_path)?;
    let partial = partial_sibling_path(local_path);

    monitor.init(TransferDirection::Get, remote_path, &destination, size);
    let outcome = (|| {
        let mut local_file = fs::File::create(&partial)?;
        let mut remote_file = link.open_read(remote_path)?;
        let moved = pump(remote_file.as_mut(), &mut local_file, &mut *monitor)?;
        local_file.sync_all()?;
        Ok::<_, SdkError>(moved)
    })();
    monitor.end();

    let (bytes, sha256) = match outcome.and_then(|moved| {
        check_complete(size, moved.0)?;
        Ok(moved)
    }) {
        Ok(moved) => moved,
        Err(err) => {
            discard_partial(&partial);
            return Err(err);
        }
    };
    commit_partial(&partial, local_path).map_err(|err| {
        discard_partial(&partial);
        SdkError::io(format!("Failed to finalize download: {}", err))
    })?;

    Ok(TransferSummary {
        direction: TransferDirection::Get,
        source: remote_path.to_string(),
        destination,
        bytes,
        sha256,
    })
}
