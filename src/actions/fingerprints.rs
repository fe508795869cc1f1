use crate::utils::fingerprint::FingerprintDigest;
use serde::Serialize;
use std::collections::BTreeMap;

/// Host key fingerprints published by the service, keyed by
/// `<KEY-TYPE>-<DIGEST>` labels such as `RSA-MD5` or `ECDSA-SHA256`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SftpFingerprints {
    hashes: BTreeMap<String, String>,
}

impl SftpFingerprints {
    pub fn label(key_type: &str, digest: FingerprintDigest) -> String {
        format!("{}-{}", key_type.trim().to_uppercase(), digest.label())
    }

    pub fn hash(&self, label: &str) -> Option<&str> {
        self.hashes.get(label).map(String::as_str)
    }

    pub fn for_key(&self, key_type: &str, digest: FingerprintDigest) -> Option<&str> {
        self.hash(&Self::label(key_type, digest))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.hashes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl<L: Into<String>, H: Into<String>> FromIterator<(L, H)> for SftpFingerprints {
    fn from_iter<I: IntoIterator<Item = (L, H)>>(iter: I) -> Self {
        Self {
            hashes: iter
                .into_iter()
                .map(|(label, hash)| (label.into(), hash.into()))
                .collect(),
        }
    }
}
