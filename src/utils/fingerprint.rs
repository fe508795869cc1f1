use base64::Engine;

/// Digest used to render a host key fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerprintDigest {
    Md5,
    Sha256,
}

impl FingerprintDigest {
    pub fn label(self) -> &'static str {
        match self {
            FingerprintDigest::Md5 => "MD5",
            FingerprintDigest::Sha256 => "SHA256",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().replace('-', "").as_str() {
            "MD5" => Some(FingerprintDigest::Md5),
            "SHA256" => Some(FingerprintDigest::Sha256),
            _ => None,
        }
    }
}

/// MD5 digests render as lowercase colon-separated hex.
pub fn format_md5(hash: &[u8]) -> String {
    hash.iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

/// SHA-256 digests render as unpadded base64, the OpenSSH style.
pub fn format_sha256(hash: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD_NO_PAD.encode(hash)
}

pub fn format_digest(digest: FingerprintDigest, hash: &[u8]) -> String {
    match digest {
        FingerprintDigest::Md5 => format_md5(hash),
        FingerprintDigest::Sha256 => format_sha256(hash),
    }
}

/// Infers which digest a textual fingerprint was produced with.
pub fn detect_digest(fingerprint: &str) -> FingerprintDigest {
    let trimmed = fingerprint.trim();
    let body = trimmed.strip_prefix("MD5:").unwrap_or(trimmed);
    let looks_md5 = body.len() == 47
        && body
            .split(':')
            .all(|pair| pair.len() == 2 && pair.chars().all(|c| c.is_ascii_hexdigit()));
    if looks_md5 {
        FingerprintDigest::Md5
    } else {
        FingerprintDigest::Sha256
    }
}

/// Canonical form used for comparisons.
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    let trimmed = fingerprint.trim();
    match detect_digest(trimmed) {
        FingerprintDigest::Md5 => trimmed
            .strip_prefix("MD5:")
            .unwrap_or(trimmed)
            .to_lowercase(),
        FingerprintDigest::Sha256 => {
            let body = trimmed
                .get(..7)
                .filter(|prefix| prefix.eq_ignore_ascii_case("sha256:"))
                .and_then(|_| trimmed.get(7..))
                .unwrap_or(trimmed);
            body.trim().trim_end_matches('=').to_string()
        }
    }
}

pub fn fingerprints_match(expected: &str, observed: &str) -> bool {
    let expected = normalize_fingerprint(expected);
    !expected.is_empty() && expected == normalize_fingerprint(observed)
}
