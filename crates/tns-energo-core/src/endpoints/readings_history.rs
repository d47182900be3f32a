//! `getReadingsHistPage` action
//!
//! The history arrives as `year -> date -> meter id -> entry`, with empty
//! strings, lists or objects standing in for missing levels.

use crate::convert;
use crate::endpoints::require_body;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::mapping::{object_of, Record};
use crate::session::{Session, Target};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub const ACTION: &str = "getReadingsHistPage";

crate::record! {
    /// Value of one tariff zone
    pub struct ReadingData {
        label: String = "label" => convert::string;
        value: i64 = "value" => convert::integer;
    }
}

crate::record! {
    /// Readings of one meter on one date
    pub struct ReadingsHistoryEntry {
        meter_code: String = "number" => convert::string;
        status: Option<i64> = "status" => convert::integer_opt;
        readings: BTreeMap<String, ReadingData> = "readings" => readings, default = BTreeMap::new();
    }
}

pub type ReadingsHistory = BTreeMap<i64, BTreeMap<NaiveDate, BTreeMap<String, ReadingsHistoryEntry>>>;

fn is_void(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

fn readings(value: &Value) -> Result<BTreeMap<String, ReadingData>> {
    if is_void(value) {
        return Ok(BTreeMap::new());
    }
    let Some(zones) = object_of(value, "readings")? else {
        return Ok(BTreeMap::new());
    };

    let mut result = BTreeMap::new();
    for (zone, data) in &zones {
        if is_void(data) {
            continue;
        }
        result.insert(zone.clone(), ReadingData::from_response(data)?);
    }
    Ok(result)
}

fn history(value: &Value) -> Result<ReadingsHistory> {
    let mut result = ReadingsHistory::new();
    if is_void(value) {
        return Ok(result);
    }
    let Some(years) = object_of(value, "readings history")? else {
        return Ok(result);
    };

    for (year, dates) in &years {
        if is_void(dates) {
            continue;
        }
        let Some(dates) = object_of(dates, "readings history year")? else {
            continue;
        };
        let year = convert::integer(&Value::String(year.clone()))?;

        for (date, meters) in &dates {
            if is_void(meters) {
                continue;
            }
            let Some(meters) = object_of(meters, "readings history date")? else {
                continue;
            };
            let Some(date) = convert::date_opt(&Value::String(date.clone()))? else {
                warn!("skipping readings without a date in year {}", year);
                continue;
            };

            for (meter, data) in &meters {
                if is_void(data) {
                    continue;
                }
                if !data.is_object() {
                    return Err(Error::format(format!(
                        "readings entry for meter {meter} must be a mapping, got {data}"
                    )));
                }
                result
                    .entry(year)
                    .or_default()
                    .entry(date)
                    .or_default()
                    .insert(meter.clone(), ReadingsHistoryEntry::from_response(data)?);
            }
        }
    }

    Ok(result)
}

crate::record! {
    /// `getReadingsHistPage` response
    pub struct ReadingsHistoryPage {
        history: ReadingsHistory = "history" => history;
    }
}

impl Envelope for ReadingsHistoryPage {}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target(ACTION, code)
}

pub async fn request_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(target(session, code)).await
}

pub async fn request(session: &Session, code: &str) -> Result<ReadingsHistoryPage> {
    let raw = require_body(request_raw(session, code).await?, ACTION)?;
    ReadingsHistoryPage::from_envelope(&raw)
}
