use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["code", "password", "passphrase", "secret", "token", "clientkey"]
        .into_iter()
        .collect()
});

/// Matches `Code=...` style pairs inside an encoded request query.
static QUERY_SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|&)(code|password|clientkey)=([^&]*)").expect("query redaction regex")
});

/// Matches `"Password":"..."` style members inside raw JSON text.
static JSON_SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"(code|password|passphrase|secret|token|clientkey)"\s*:\s*"[^"]*"?"#)
        .expect("json redaction regex")
});

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(normalized.as_str()) || normalized.contains("password")
}

/// Masks credential values in a request query so it can be logged.
pub fn redact_query(query: &str) -> String {
    QUERY_SECRET_PATTERN
        .replace_all(query, format!("$1$2={}", INLINE_REDACTION).as_str())
        .to_string()
}

/// Masks secrets in free text that may hold a query or a (possibly cut)
/// JSON body.
pub fn mask_inline_secrets(text: &str) -> String {
    let replacement = format!("\"$1\":\"{}\"", INLINE_REDACTION);
    let masked = JSON_SECRET_PATTERN.replace_all(text, replacement.as_str());
    redact_query(&masked)
}

/// Shortens text for a log line; does not hide anything.
pub fn truncate_for_log(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    format!("{}...", truncate_utf8_prefix(value, max_length))
}

/// Log-safe view of a response body: the parsed JSON with sensitive
/// members masked, or only its size when it is not JSON.
pub fn redact_response_body(body: &str) -> Value {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(parsed) => redact_object(&parsed),
        Err(_) => serde_json::json!({ "bytes": body.len() }),
    }
}

/// Replaces sensitive fields of a JSON payload, recursing into arrays and objects.
pub fn redact_object(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(redact_object).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                    continue;
                }
                out.insert(key.clone(), redact_object(entry));
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        mask_inline_secrets, redact_object, redact_query, redact_response_body, truncate_for_log,
    };
    use serde_json::Value;

    #[test]
    fn redact_query_masks_credential_only() {
        let query = "Version=3.0&User=user&Code=secret&Action=INIT&ClientKey=abc";
        assert_eq!(
            redact_query(query),
            "Version=3.0&User=user&Code=***REDACTED***&Action=INIT&ClientKey=***REDACTED***"
        );
    }

    #[test]
    fn redact_object_masks_sftp_password() {
        let input = serde_json::json!({"Action": "SFTP", "Login": "Vt504", "Password": "pw"});
        let out = redact_object(&input);
        assert_eq!(out["Password"], Value::String("[REDACTED]".to_string()));
        assert_eq!(out["Login"], Value::String("Vt504".to_string()));
    }

    #[test]
    fn truncate_for_log_shortens_long_values() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }

    #[test]
    fn response_body_hides_sftp_password() {
        let body = r#"{"Action":"SFTP","Host":"peakinvestigator.veritomyx.com","Port":22022,"Directory":"/files","Login":"Vt504","Password":"0UtnWMvzoi2jF4BQ"}"#;
        let logged = redact_response_body(body);
        assert_eq!(logged["Login"], Value::String("Vt504".to_string()));
        assert_eq!(logged["Password"], Value::String("[REDACTED]".to_string()));
        assert!(!logged.to_string().contains("0UtnWMvzoi2jF4BQ"));
    }

    #[test]
    fn non_json_body_is_logged_by_size_only() {
        let logged = redact_response_body("Password=hunter2");
        assert_eq!(logged, serde_json::json!({"bytes": 16}));
    }

    #[test]
    fn inline_masking_covers_cut_json_and_queries() {
        let cut = r#"{"Action":"SFTP","Login":"Vt504","Password":"0UtnWMvz"#;
        let masked = mask_inline_secrets(cut);
        assert!(!masked.contains("0UtnWMvz"));
        assert!(masked.contains(r#""Login":"Vt504""#));

        let query = mask_inline_secrets("User=user&Code=secret&Action=RUN");
        assert_eq!(query, "User=user&Code=***REDACTED***&Action=RUN");
    }
}
