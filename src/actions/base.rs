use crate::constants::protocol::{API_VERSION, DATETIME_FORMAT};
use crate::errors::{RemoteError, SdkError};
use chrono::NaiveDateTime;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Protocol version plus the account credentials every request starts with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    version: String,
    user: String,
    code: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            version: API_VERSION.to_string(),
            user: user.into(),
            code: code.into(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("version", &self.version)
            .field("user", &self.user)
            .field("code", &"[REDACTED]")
            .finish()
    }
}

/// Ordered `Key=Value` pairs; order is part of the wire contract.
pub(crate) struct QueryBuilder {
    pairs: Vec<(&'static str, String)>,
}

impl QueryBuilder {
    pub(crate) fn new(credentials: &Credentials, action: &str) -> Self {
        Self {
            pairs: vec![
                ("Version", credentials.version.clone()),
                ("User", credentials.user.clone()),
                ("Code", credentials.code.clone()),
                ("Action", action.to_string()),
            ],
        }
    }

    pub(crate) fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    pub(crate) fn push_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    pub(crate) fn finish(self) -> Result<String, SdkError> {
        serde_urlencoded::to_string(&self.pairs)
            .map_err(|err| SdkError::configuration(format!("Failed to encode request: {}", err)))
    }
}

/// Outcome of the most recent `process_response` call.
#[derive(Debug, Clone)]
pub(crate) enum ResponseState<T> {
    Pending,
    Parsed(T),
    Failed(RemoteError),
}

impl<T> Default for ResponseState<T> {
    fn default() -> Self {
        ResponseState::Pending
    }
}

impl<T> ResponseState<T> {
    pub(crate) fn parsed(&self) -> Option<&T> {
        match self {
            ResponseState::Parsed(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn error(&self) -> Option<&RemoteError> {
        match self {
            ResponseState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, ResponseState::Parsed(_))
    }

    pub(crate) fn reset(&mut self) {
        *self = ResponseState::Pending;
    }

    /// Parses `response` as payload `R` and converts it into `T`.
    ///
    /// Format errors leave the state `Pending` so no stale result survives.
    pub(crate) fn process<R>(&mut self, response: &str, action: &str) -> Result<(), SdkError>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = SdkError>,
    {
        self.reset();
        match parse_envelope(response, action)? {
            Envelope::Failed(err) => *self = ResponseState::Failed(err),
            Envelope::Payload(value) => {
                let raw: R = serde_json::from_value(value)?;
                *self = ResponseState::Parsed(T::try_from(raw)?);
            }
        }
        Ok(())
    }
}

pub(crate) enum Envelope {
    Payload(Value),
    Failed(RemoteError),
}

/// Validates the shared response envelope: a JSON object echoing `Action`,
/// optionally carrying `Error`/`Message`/`Location`.
pub(crate) fn parse_envelope(response: &str, expected_action: &str) -> Result<Envelope, SdkError> {
    let value: Value = serde_json::from_str(response.trim())?;
    let obj = value
        .as_object()
        .ok_or_else(|| SdkError::response_format("Response is not a JSON object"))?;
    let action = obj
        .get("Action")
        .and_then(Value::as_str)
        .ok_or_else(|| SdkError::response_format("Response is missing the Action field"))?;
    if action != expected_action {
        return Err(SdkError::response_format(format!(
            "Response is for action {} (expected {})",
            action, expected_action
        )));
    }

    if let Some(code) = obj.get("Error") {
        let code = value_as_i64(code).ok_or_else(|| {
            SdkError::response_format(format!("Error code is not numeric: {}", code))
        })?;
        let message = obj
            .get("Message")
            .and_then(Value::as_str)
            .ok_or_else(|| SdkError::response_format("Error response is missing Message"))?;
        let location = obj
            .get("Location")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Ok(Envelope::Failed(RemoteError {
            action: action.to_string(),
            code,
            message: message.to_string(),
            location: location.to_string(),
        }));
    }

    Ok(Envelope::Payload(value))
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, SdkError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT).map_err(|err| {
        SdkError::response_format(format!("Invalid timestamp {:?}: {}", raw, err))
    })
}

fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
}

fn value_as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

// The service is inconsistent about quoting numbers, so accept both forms.

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_as_f64(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_as_u64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected an unsigned integer, got {}", value)))
}

pub(crate) fn lenient_opt_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    value_as_u64(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected an unsigned integer, got {}", value)))
}

pub(crate) fn lenient_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    value_as_f64(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}
