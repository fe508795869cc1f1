pub mod fingerprint;
pub mod fs_atomic;
pub mod redact;
pub mod text;
