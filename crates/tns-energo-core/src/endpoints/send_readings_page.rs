//! `getSendReadingsPage` action

use crate::convert;
use crate::endpoints::require_body;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::mapping::{nested_list, object_of};
use crate::session::{Session, Target};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

pub const ACTION: &str = "getSendReadingsPage";

crate::record! {
    /// One tariff zone row of a meter, carrying the meter's own fields too
    pub struct ZoneData {
        identifier: String = "RowID" => convert::string;
        index: i64 = "NomerTarifa" => convert::integer;
        name: String = "NazvanieTarifa" => convert::string;
        last_indication: Option<i64> = "PredPok" => convert::integer_opt;
        transmission_coefficient: f64 = "KoefTrans" => convert::float;
        max_indication_difference: f64 = "MaxPok" => convert::float;
        r#type: i64 = "Type" => convert::integer;
        can_delete: bool = "Can_delete" => convert::boolean;
        closing_indication: Option<f64> = "zakrPok" => convert::float_opt;
        label: String = "Label" => convert::string;
        sort: i64 = "sort" => convert::integer;
        checkup_status: i64 = "DatePoverStatus" => convert::integer;
        checkup_url: Option<String> = "DatePoverURL" => convert::string_opt, default = None;
        checkup_date: Option<NaiveDate> = "DatePover" => convert::date_opt, default = None;
        status: String = "RaschSch" => convert::string;
        install_location: String = "MestoUst" => convert::string;
        manufactured_date: Option<NaiveDate> = "GodVipuska" => convert::date_opt, default = None;
        last_checkup_date: Option<NaiveDate> = "DatePosledPover" => convert::date_opt, default = None;
        model: String = "ModelPU" => convert::string;
        zone_count: i64 = "Tarifnost" => convert::integer;
        last_indications_date: Option<NaiveDate> = "DatePok" => convert::date_opt, default = None;
        service_number: String = "NomerUslugi" => convert::string;
        service_name: String = "NazvanieUslugi" => convert::string;
        code: String = "ZavodNomer" => convert::string;
        precision: i64 = "Razradnost" => convert::integer;
    }
}

/// Zone rows per meter identifier, each list ordered by (`sort`, index)
pub type Counters = BTreeMap<String, Vec<ZoneData>>;

fn counters(value: &Value) -> Result<Counters> {
    let Some(meters) = object_of(value, "counters")? else {
        return Ok(BTreeMap::new());
    };

    meters
        .iter()
        .map(|(meter_id, rows)| {
            let mut rows: Vec<ZoneData> = nested_list(rows)?;
            rows.sort_by_key(|row| (row.sort, row.index));
            Ok((meter_id.clone(), rows))
        })
        .collect()
}

crate::record! {
    /// `getSendReadingsPage` response
    pub struct SendReadingsPage {
        status: String = "STATUS" => convert::string;
        counters: Counters = "counters" => counters;
    }
}

impl Envelope for SendReadingsPage {}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target(ACTION, code)
}

pub async fn request_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(target(session, code)).await
}

pub async fn request(session: &Session, code: &str) -> Result<SendReadingsPage> {
    let raw = require_body(request_raw(session, code).await?, ACTION)?;
    SendReadingsPage::from_envelope(&raw)
}
