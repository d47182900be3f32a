//! One module per vendor action
//!
//! Each module declares the records of its response and exposes
//! `request_raw` (decoded JSON) and `request` (validated envelope record).

pub mod accounts;
pub mod authorization;
pub mod digital_receipt;
pub mod main_page;
pub mod payments;
pub mod readings_history;
pub mod send_readings;
pub mod send_readings_page;

use crate::error::{Error, Result};
use serde_json::Value;

/// Fail with [`Error::EmptyResult`] when the vendor sent no body
pub(crate) fn require_body(raw: Value, action: &'static str) -> Result<Value> {
    if raw.is_null() {
        tracing::warn!("action {} returned an empty body", action);
        return Err(Error::EmptyResult { action });
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_body() {
        assert!(matches!(
            require_body(Value::Null, "getMainpage"),
            Err(Error::EmptyResult { action: "getMainpage" })
        ));
        assert_eq!(require_body(json!({}), "x").unwrap(), json!({}));
    }
}
