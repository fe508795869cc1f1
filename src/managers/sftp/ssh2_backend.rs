use super::{SftpBackend, SftpLink};
use crate::errors::SdkError;
use crate::services::logger::Logger;
use crate::utils::fingerprint::{format_digest, FingerprintDigest};
use ssh2::{HashType, HostKeyType, OpenFlags, OpenType, Session, Sftp};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Real SFTP over libssh2.
#[derive(Debug, Clone)]
pub struct Ssh2Backend {
    logger: Logger,
}

impl Ssh2Backend {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("ssh2"),
        }
    }
}

impl SftpBackend for Ssh2Backend {
    fn open(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn SftpLink>, SdkError> {
        if timeout.is_zero() {
            return Err(SdkError::configuration("SFTP timeout must be greater than zero"));
        }
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| SdkError::unknown_host(format!("unknown host: {}", host)))?
            .next()
            .ok_or_else(|| SdkError::unknown_host(format!("unknown host: {}", host)))?;

        let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|err| match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                SdkError::timeout(format!("timeout: socket is not established to {}", addr))
            }
            _ => SdkError::connection(format!("Failed to connect to {}: {}", addr, err)),
        })?;
        tcp.set_read_timeout(Some(timeout)).ok();
        tcp.set_write_timeout(Some(timeout)).ok();

        let mut session =
            Session::new().map_err(|_| SdkError::connection("Failed to create SSH session"))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake().map_err(|err| {
            let mapped = map_ssh_error(err);
            if mapped.kind == crate::errors::SdkErrorKind::Timeout {
                mapped
            } else {
                SdkError::connection(format!("connection is closed by foreign host: {}", mapped))
            }
        })?;
        self.logger.debug(
            "handshake complete",
            Some(&serde_json::json!({"host": host, "port": port})),
        );

        Ok(Box::new(Ssh2Link {
            session,
            sftp: None,
        }))
    }
}

struct Ssh2Link {
    session: Session,
    sftp: Option<Sftp>,
}

impl Ssh2Link {
    fn sftp(&self) -> Result<&Sftp, SdkError> {
        self.sftp
            .as_ref()
            .ok_or_else(|| SdkError::connection("SFTP channel is not open"))
    }
}

impl SftpLink for Ssh2Link {
    fn host_key_type(&self) -> Option<String> {
        let (_, key_type) = self.session.host_key()?;
        let label = match key_type {
            HostKeyType::Rsa => "RSA",
            HostKeyType::Dss => "DSA",
            HostKeyType::Ecdsa256 | HostKeyType::Ecdsa384 | HostKeyType::Ecdsa521 => "ECDSA",
            HostKeyType::Unknown => return None,
            _ => "ED25519",
        };
        Some(label.to_string())
    }

    fn host_key_fingerprint(&self, digest: FingerprintDigest) -> Option<String> {
        let hash_type = match digest {
            FingerprintDigest::Md5 => HashType::Md5,
            FingerprintDigest::Sha256 => HashType::Sha256,
        };
        let hash = self.session.host_key_hash(hash_type)?;
        Some(format_digest(digest, hash))
    }

    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SdkError> {
        self.session
            .userauth_password(username, password)
            .map_err(|err| SdkError::authentication(format!("Auth fail: {}", err)))?;
        if !self.session.authenticated() {
            return Err(SdkError::authentication("Auth fail"));
        }
        let sftp = self.session.sftp().map_err(map_ssh_error)?;
        self.sftp = Some(sftp);
        Ok(())
    }

    fn file_size(&mut self, path: &str) -> Result<u64, SdkError> {
        let stat = self.sftp()?.stat(Path::new(path)).map_err(map_ssh_error)?;
        stat.size
            .ok_or_else(|| SdkError::transfer(format!("Remote file {} has no size", path)))
    }

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, SdkError> {
        let file = self.sftp()?.open(Path::new(path)).map_err(map_ssh_error)?;
        Ok(Box::new(file))
    }

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, SdkError> {
        let file = self
            .sftp()?
            .open_mode(
                Path::new(path),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                0o644,
                OpenType::File,
            )
            .map_err(map_ssh_error)?;
        Ok(Box::new(file))
    }

    fn close(&mut self) {
        self.sftp = None;
        let _ = self.session.disconnect(None, "transfer complete", None);
    }
}

fn map_ssh_error(err: ssh2::Error) -> SdkError {
    let io_err: std::io::Error = err.into();
    match io_err.kind() {
        std::io::ErrorKind::TimedOut => SdkError::timeout("SSH operation timed out"),
        std::io::ErrorKind::NotFound => SdkError::transfer(format!("SFTP error: {}", io_err)),
        std::io::ErrorKind::PermissionDenied => {
            SdkError::transfer(format!("SFTP permission denied: {}", io_err))
        }
        _ => SdkError::connection(format!("SSH error: {}", io_err)),
    }
}
