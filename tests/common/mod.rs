#![allow(dead_code)]

use peakinvestigator::actions::{SftpFingerprints, SftpSettings};
use peakinvestigator::errors::SdkError;
use peakinvestigator::managers::sftp::{
    ProgressMonitor, SftpBackend, SftpLink, TransferDirection,
};
use peakinvestigator::services::transport::Transport;
use peakinvestigator::utils::fingerprint::FingerprintDigest;
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ERROR_CREDENTIALS: &str = r#"{"Action":"ACTION","Error":3,"Message":"Invalid username or password - can not validate","Location":""}"#;

pub const VERSIONS_RESPONSE_1: &str = r#"{"Action":"PI_VERSIONS","Current":"1.2","LastUsed":"","Count":2,"Versions":["1.2","1.0.0"]}"#;

pub const VERSIONS_RESPONSE_2: &str = r#"{"Action":"PI_VERSIONS","Current":"1.3","LastUsed":"1.2","Count":3,"Versions":["1.3","1.2","1.0.0"]}"#;

pub const INIT_RESPONSE_1: &str = r#"{"Action":"INIT","Job":"V-504.1551","ID":504,"Funds":115.01,"EstimatedCost":[{"Instrument":"TOF","RTO":"RTO-24","Cost":27.60},{"Instrument":"Orbitrap","RTO":"RTO-24","Cost":36.22},{"Instrument":"IonTrap","RTO":"RTO-24","Cost":32.59}]}"#;

pub const INIT_RESPONSE_2: &str = r#"{"Action":"INIT","Job":"V-504.1551","ID":504,"Funds":115.01,"EstimatedCost":[{"Instrument":"TOF","RTO":"RTO-24","Cost":27.60},{"Instrument":"Orbitrap","RTO":"RTO-24","Cost":36.22},{"Instrument":"IonTrap","RTO":"RTO-24","Cost":32.59},{"Instrument":"TOF","RTO":"RTO-0","Cost":270.60},{"Instrument":"Orbitrap","RTO":"RTO-0","Cost":360.22},{"Instrument":"IonTrap","RTO":"RTO-0","Cost":320.59}]}"#;

pub const SFTP_RESPONSE_1: &str = r#"{"Action":"SFTP","Host":"peakinvestigator.veritomyx.com","Port":22022,"Directory":"/files","Login":"Vt504","Password":"0UtnWMvzoi2jF4BQ","Fingerprints":[{"Signature":"DSA","Algorithm":"MD5","Hash":"96:bd:da:62:5a:53:1a:2f:82:87:65:7f:c0:45:71:94"},{"Signature":"DSA","Algorithm":"SHA256","Hash":"b9SOs40umHMywBa2GtdsOhr/wgP1L6nfXWugjRrJTaM"},{"Signature":"ECDSA","Algorithm":"MD5","Hash":"5c:6f:c7:c7:79:c0:76:90:4d:3a:a1:7a:81:0e:0a:57"},{"Signature":"ECDSA","Algorithm":"SHA256","Hash":"d2HXgeUSmWN+gq+9V7Wad5xWaCxk+mh45F81K951MCU"},{"Signature":"RSA","Algorithm":"MD5","Hash":"d2:be:b8:2e:3c:be:84:e4:a3:0a:c8:42:5c:6b:39:4e"},{"Signature":"RSA","Algorithm":"SHA256","Hash":"QBsg8ejj4gZun4AWd4WBTJw89ftcLR9x/dZoG223srg"}]}"#;

pub const PREP_RESPONSE_1: &str = r#"{"Action":"PREP","File":"file.tar","Status":"Analyzing","PercentComplete":"90%","ScanCount":0,"MSType":"TBD"}"#;

pub const PREP_RESPONSE_2: &str = r#"{"Action":"PREP","File":"file.tar","Status":"Ready","ScanCount":3336,"MSType":"Orbitrap"}"#;

pub const RUN_RESPONSE_1: &str = r#"{"Action":"RUN","Job":"P-504.1463"}"#;

pub const STATUS_RESPONSE_1: &str = r#"{"Action":"STATUS","Job":"P-504.5148","Status":"Running","Datetime":"2016-02-03 18:25:09"}"#;

pub const STATUS_RESPONSE_2: &str = r#"{"Action":"STATUS","Job":"P-504.5148","Status":"Done","Datetime":"2016-02-03 18:31:05","ScansInput":3,"ScansComplete":3,"ActualCost":0.36,"JobLogFile":"/files/P-504.5148/P-504.5148.log.txt","ResultsFile":"/files/P-504.5148/P-504.5148.mass_list.tar"}"#;

pub const STATUS_RESPONSE_3: &str = r#"{"Action":"STATUS","Job":"P-504.5148","Status":"Deleted","Datetime":"2016-02-03 18:36:05"}"#;

pub const DELETE_RESPONSE_1: &str = r#"{"Action":"DELETE","Job":"P-504.4256","Datetime":"2016-02-03 18:35:06"}"#;

pub const CREDENTIALS_MESSAGE: &str = "Invalid username or password - can not validate";

pub fn credentials_error(action: &str) -> String {
    ERROR_CREDENTIALS.replace("ACTION", action)
}

pub fn tmp_path(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}

/// Replays canned responses and records every query it was given.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<String, SdkError>>>,
    queries: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<String, SdkError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(responses: &[&str]) -> Arc<Self> {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, query: &str) -> Result<String, SdkError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(SdkError::connection("no canned response left")))
    }
}

pub const FAKE_RSA_MD5: &str = "d2:be:b8:2e:3c:be:84:e4:a3:0a:c8:42:5c:6b:39:4e";
pub const FAKE_RSA_SHA256: &str = "QBsg8ejj4gZun4AWd4WBTJw89ftcLR9x/dZoG223srg";
pub const FAKE_USER: &str = "Vt504";
pub const FAKE_PASSWORD: &str = "0UtnWMvzoi2jF4BQ";

#[derive(Default)]
pub struct RemoteStore {
    pub files: HashMap<String, Vec<u8>>,
    pub bytes_written: u64,
    pub opened: usize,
    pub closed: usize,
}

/// In-memory SFTP server presenting an RSA host key.
pub struct FakeSftpBackend {
    pub store: Arc<Mutex<RemoteStore>>,
    pub open_error: Option<SdkError>,
}

impl FakeSftpBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Mutex::new(RemoteStore::default())),
            open_error: None,
        })
    }

    pub fn failing(err: SdkError) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Mutex::new(RemoteStore::default())),
            open_error: Some(err),
        })
    }

    pub fn put_remote(&self, path: &str, content: &[u8]) {
        self.store
            .lock()
            .expect("store lock")
            .files
            .insert(path.to_string(), content.to_vec());
    }

    pub fn remote(&self, path: &str) -> Option<Vec<u8>> {
        self.store.lock().expect("store lock").files.get(path).cloned()
    }

    pub fn bytes_written(&self) -> u64 {
        self.store.lock().expect("store lock").bytes_written
    }

    pub fn open_and_closed(&self) -> (usize, usize) {
        let store = self.store.lock().expect("store lock");
        (store.opened, store.closed)
    }
}

impl SftpBackend for FakeSftpBackend {
    fn open(&self, host: &str, _port: u16, _timeout: Duration) -> Result<Box<dyn SftpLink>, SdkError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        if host == "unknown.example.com" {
            return Err(SdkError::unknown_host(format!("unknown host: {}", host)));
        }
        self.store.lock().expect("store lock").opened += 1;
        Ok(Box::new(FakeLink {
            store: self.store.clone(),
            authenticated: false,
            closed: false,
        }))
    }
}

struct FakeLink {
    store: Arc<Mutex<RemoteStore>>,
    authenticated: bool,
    closed: bool,
}

impl FakeLink {
    fn ensure_ready(&self) -> Result<(), SdkError> {
        if self.closed || !self.authenticated {
            return Err(SdkError::connection("link is not authenticated"));
        }
        Ok(())
    }
}

impl SftpLink for FakeLink {
    fn host_key_type(&self) -> Option<String> {
        Some("RSA".to_string())
    }

    fn host_key_fingerprint(&self, digest: FingerprintDigest) -> Option<String> {
        Some(match digest {
            FingerprintDigest::Md5 => FAKE_RSA_MD5.to_string(),
            FingerprintDigest::Sha256 => FAKE_RSA_SHA256.to_string(),
        })
    }

    fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SdkError> {
        if username != FAKE_USER || password != FAKE_PASSWORD {
            return Err(SdkError::authentication("Auth fail"));
        }
        self.authenticated = true;
        Ok(())
    }

    fn file_size(&mut self, path: &str) -> Result<u64, SdkError> {
        self.ensure_ready()?;
        self.store
            .lock()
            .expect("store lock")
            .files
            .get(path)
            .map(|content| content.len() as u64)
            .ok_or_else(|| SdkError::transfer(format!("No such file: {}", path)))
    }

    fn open_read(&mut self, path: &str) -> Result<Box<dyn Read + '_>, SdkError> {
        self.ensure_ready()?;
        let content = self
            .store
            .lock()
            .expect("store lock")
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| SdkError::transfer(format!("No such file: {}", path)))?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    fn open_write(&mut self, path: &str) -> Result<Box<dyn Write + '_>, SdkError> {
        self.ensure_ready()?;
        Ok(Box::new(RemoteWriter {
            store: self.store.clone(),
            path: path.to_string(),
            buf: Vec::new(),
        }))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.lock().expect("store lock").closed += 1;
        }
    }
}

struct RemoteWriter {
    store: Arc<Mutex<RemoteStore>>,
    path: String,
    buf: Vec<u8>,
}

impl Write for RemoteWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.store.lock().expect("store lock").bytes_written += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.store
            .lock()
            .expect("store lock")
            .files
            .insert(self.path.clone(), self.buf.clone());
        Ok(())
    }
}

/// Settings matching the fake server, published fingerprints included.
pub fn fake_settings(directory: &str) -> SftpSettings {
    let fingerprints: SftpFingerprints = [("RSA-MD5", FAKE_RSA_MD5), ("RSA-SHA256", FAKE_RSA_SHA256)]
        .into_iter()
        .collect();
    SftpSettings {
        host: "sftp.example.com".to_string(),
        port: 22022,
        username: FAKE_USER.to_string(),
        password: FAKE_PASSWORD.to_string(),
        directory: directory.to_string(),
        fingerprints,
    }
}

/// Records what a transfer reported, like a headless progress bar.
#[derive(Debug, Default)]
pub struct HeadlessMonitor {
    pub direction: Option<TransferDirection>,
    pub source: String,
    pub destination: String,
    pub max: u64,
    pub counts: Vec<u64>,
    pub transferred: u64,
    pub ended: bool,
    pub cancel_after: Option<u64>,
}

impl ProgressMonitor for HeadlessMonitor {
    fn init(&mut self, direction: TransferDirection, source: &str, destination: &str, total: u64) {
        self.direction = Some(direction);
        self.source = source.to_string();
        self.destination = destination.to_string();
        self.max = total;
    }

    fn count(&mut self, bytes: u64) -> bool {
        self.transferred += bytes;
        self.counts.push(bytes);
        match self.cancel_after {
            Some(limit) => self.transferred < limit,
            None => true,
        }
    }

    fn end(&mut self) {
        self.ended = true;
    }
}
