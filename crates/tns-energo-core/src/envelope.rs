//! Vendor response envelope
//!
//! Every action answers with a JSON object carrying a `result` flag, read with
//! the boolean converter. When the flag is false the remaining keys describe
//! the failure instead of data, so the envelope is checked before any field
//! mapping happens.

use crate::convert;
use crate::error::{Error, Result};
use crate::mapping::Record;
use serde_json::{Map, Value};

const CODE_KEYS: [&str; 2] = ["error", "errorCode"];
const MESSAGE_KEYS: [&str; 3] = ["errMsg", "errorMessage", "errorHeader"];

const UNKNOWN_CODE: &str = "-1";
const NO_DESCRIPTION: &str = "<no description provided>";

/// Record wrapped in the `result` envelope
pub trait Envelope: Record {
    /// Validate the envelope, then map the payload
    fn from_envelope(raw: &Value) -> Result<Self> {
        check(raw)?;
        Self::from_response(raw)
    }
}

/// Raise [`Error::Response`] when the payload reports failure
pub fn check(raw: &Value) -> Result<()> {
    let object = raw.as_object().ok_or_else(|| Error::InvalidResponse {
        status: None,
        message: format!("response is not a JSON object: {raw}"),
    })?;

    let result = object.get("result").ok_or_else(|| Error::MissingField {
        record: "Envelope",
        field: "result".to_string(),
    })?;

    if convert::boolean(result)? {
        return Ok(());
    }

    let code = first_present(object, &CODE_KEYS)
        .map(text_of)
        .unwrap_or_else(|| UNKNOWN_CODE.to_string());
    let message = first_present(object, &MESSAGE_KEYS)
        .map(text_of)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    tracing::debug!("envelope rejected: [{}] {}", code, message);
    Err(Error::Response { code, message })
}

fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
