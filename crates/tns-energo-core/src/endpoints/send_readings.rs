//! `sendReadings` action

use crate::convert;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::mapping::Record;
use crate::session::{Session, Target};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// Multipart field carrying the submission
pub const FORM_FIELD: &str = "readings";

crate::record! {
    /// Account balance breakdown returned after a submission
    pub struct ReadingsResultData {
        initial: f64 = "ВХСАЛЬДО" => convert::float;
        debt: f64 = "ЗАДОЛЖЕННОСТЬ" => convert::float;
        debt_disable: f64 = "ЗАДОЛЖЕННОСТЬОТКЛ" => convert::float;
        debt_penalty: f64 = "ЗАДОЛЖЕННОСТЬПЕНИ" => convert::float;
        debt_install: f64 = "ЗАДОЛЖЕННОСТЬПОДКЛ" => convert::float;
        period: NaiveDate = "ЗАКРЫТЫЙМЕСЯЦ" => convert::date;
        charged_meter: f64 = "НАЧИСЛЕНОПОИПУ" => convert::float;
        recalculations: f64 = "ПЕРЕРАСЧЕТ" => convert::float;
        projected_meter: f64 = "ПРОГНОЗПОИПУ" => convert::float;
        loss: f64 = "СУМАПОТЕРИ" => convert::float;
        total: f64 = "СУММАКОПЛАТЕ" => convert::float;
        projected_communal: f64 = "СУММАОДНПРОГНОЗ" => convert::float;
        projected_penalty: f64 = "СУММАПЕНИПРОГНОЗ" => convert::float;
        paid: f64 = "СУММАПЛАТЕЖЕЙ" => convert::float;
        projected_charged: f64 = "СУММАПРОГНОЗНАЧ" => convert::float;
        is_meter_charged: bool = "ФНАЧИСЛЕНОПОИПУ" => convert::boolean;
        total_pseudo: f64 = "KOPLATEPSEVDO" => convert::float;
    }
}

fn result_data(value: &Value) -> Result<ReadingsResultData> {
    ReadingsResultData::from_response(value)
}

crate::record! {
    /// `sendReadings` response
    pub struct SendReadingsResult {
        result: bool = "result" => convert::boolean;
        data: ReadingsResultData = "data" => result_data;
    }
}

impl Envelope for SendReadingsResult {}

/// One zone value to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIndication {
    pub meter_code: String,
    pub value: i64,
    pub label: String,
    pub index: i64,
    pub identifier: String,
}

/// Wire shape: every member is sent as a string
#[derive(Serialize)]
struct WireIndication {
    #[serde(rename = "counterNumber")]
    counter_number: String,
    #[serde(rename = "newPok")]
    new_pok: String,
    label: String,
    #[serde(rename = "nomerTarifa")]
    nomer_tarifa: String,
    #[serde(rename = "rowID")]
    row_id: String,
}

impl From<&NewIndication> for WireIndication {
    fn from(indication: &NewIndication) -> Self {
        Self {
            counter_number: indication.meter_code.clone(),
            new_pok: indication.value.to_string(),
            label: indication.label.clone(),
            nomer_tarifa: indication.index.to_string(),
            row_id: indication.identifier.clone(),
        }
    }
}

/// JSON array submitted under [`FORM_FIELD`]
pub fn payload(indications: &[NewIndication]) -> Result<Value> {
    let wire: Vec<WireIndication> = indications.iter().map(WireIndication::from).collect();
    serde_json::to_value(wire)
        .map_err(|e| crate::Error::format(format!("could not encode readings: {e}")))
}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target("sendReadings", code)
}

pub async fn request_raw(
    session: &Session,
    code: &str,
    indications: &[NewIndication],
) -> Result<Value> {
    session
        .post(target(session, code), &payload(indications)?, FORM_FIELD)
        .await
}

pub async fn request(
    session: &Session,
    code: &str,
    indications: &[NewIndication],
) -> Result<SendReadingsResult> {
    SendReadingsResult::from_envelope(&request_raw(session, code, indications).await?)
}
