//! Account-level object model over the endpoint operations
//!
//! [`Account`], [`Meter`] and friends are plain values. Every network-backed
//! method borrows the [`Session`] it should run on, so a value can outlive or
//! move between sessions for the same credentials.

use crate::convert;
use crate::endpoints::accounts::{self, AccountDetails, AccountInfo};
use crate::endpoints::authorization::{self, Authorization};
use crate::endpoints::digital_receipt::{self, DigitalReceiptStatus};
use crate::endpoints::main_page::{self, MainPage};
use crate::endpoints::payments;
use crate::endpoints::readings_history;
use crate::endpoints::send_readings::{self, NewIndication, SendReadingsResult};
use crate::endpoints::send_readings_page::{self, ZoneData};
use crate::error::{Error, Result};
use crate::mapping::{Record, ToRaw};
use crate::session::Session;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Vendor zone codes of the readings history and their zone keys
pub const ZONE_CODES: [(&str, &str); 3] = [("pik", "t1"), ("night", "t2"), ("ppik", "t3")];

/// Map a history zone code to its zone key; unknown codes pass through
pub fn normalize_zone_code(code: &str) -> String {
    ZONE_CODES
        .iter()
        .find(|(vendor, _)| *vendor == code)
        .map(|(_, key)| key.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Fill in open bounds and check ordering.
///
/// A missing start is the earliest representable moment, a missing end is
/// the current local time.
pub fn process_start_end(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = start.unwrap_or(NaiveDateTime::MIN);
    let end = end.unwrap_or_else(|| Local::now().naive_local());

    if start > end {
        return Err(Error::invalid_argument(format!(
            "start ({start}) cannot be greater than end ({end})"
        )));
    }
    Ok((start, end))
}

/// Optional bounds of a history query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Whole days: from the start of `start` to the end of `end`
    pub fn dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.map(|d| d.and_time(NaiveTime::MIN)),
            end: end.and_then(|d| d.and_hms_opt(23, 59, 59)),
        }
    }

    pub fn resolve(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        process_start_end(self.start, self.end)
    }
}

crate::record! {
    /// A personal account
    pub struct Account {
        code: String => convert::string;
        address: Option<String> => convert::string_opt, default = None;
        debt: f64 => convert::float_or_zero, default = 0.0;
        email: Option<String> => convert::string_opt, default = None;
        digital_invoices_ignored: bool => convert::boolean, default = false;
        digital_invoices_email: Option<String> => convert::string_opt, default = None;
        digital_invoices_enabled: bool => convert::boolean, default = false;
        digital_invoices_email_comment: Option<String> => convert::string_opt, default = None;
        is_controlled: bool => convert::boolean, default = false;
        is_controlling: bool => convert::boolean, default = false;
        controlled_by_code: Option<String> => convert::string_opt, default = None;
    }
}

crate::record! {
    pub struct Payment {
        transaction_id: Option<String> => convert::string_opt;
        paid_at: NaiveDateTime => convert::datetime;
        source: String => convert::string;
        amount: f64 => convert::float;
    }
}

crate::record! {
    /// Tariff zone of a meter
    pub struct MeterZone {
        identifier: String => convert::string;
        index: i64 => convert::integer;
        name: Option<String> => convert::string_opt;
        last_indication: Option<i64> => convert::integer_opt;
        max_indication_difference: f64 => convert::float;
        closing_indication: Option<f64> => convert::float_opt;
        label: String => convert::string;
    }
}

impl MeterZone {
    /// `t1`, `t2`, ... derived from the 0-based index
    pub fn key(&self) -> String {
        format!("t{}", self.index + 1)
    }
}

/// Reading taken on one date for one meter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indication {
    pub meter_identifier: String,
    pub taken_on: NaiveDate,
    pub meter_code: String,
    pub status: i64,
    pub zones: BTreeMap<String, i64>,
}

/// Result of [`Session::authenticate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub account: Account,
    pub dependents: Vec<Account>,
    pub response: Authorization,
}

impl Account {
    pub fn from_authorization(response: &Authorization) -> Result<Self> {
        let status = &response.email_and_invoice_status;
        response.convert_to(vec![
            ("digital_invoices_email", status.digital_invoices_email.to_raw()),
            ("digital_invoices_enabled", status.digital_invoices_enabled.to_raw()),
            (
                "digital_invoices_email_comment",
                status.digital_invoices_email_comment.to_raw(),
            ),
        ])
    }

    /// List entries without `ls` are identified by their `slave_ls`
    pub fn from_info(info: &AccountInfo) -> Result<Self> {
        let code = info.code.clone().or_else(|| info.controlling_code.clone());
        info.convert_to(vec![("code", code.to_raw())])
    }

    pub fn balance(&self) -> f64 {
        -self.debt
    }

    /// Meters keyed by their serial code; meters without zone rows are skipped
    pub async fn meters(&self, session: &Session) -> Result<BTreeMap<String, Meter>> {
        let page = send_readings_page::request(session, &self.code).await?;

        let mut meters = BTreeMap::new();
        for (identifier, rows) in &page.counters {
            match Meter::from_rows(self, identifier, rows)? {
                Some(meter) => {
                    meters.insert(meter.code.clone(), meter);
                }
                None => debug!("meter {} has no zone rows, skipping", identifier),
            }
        }
        Ok(meters)
    }

    pub async fn payments(&self, session: &Session, range: DateRange) -> Result<Vec<Payment>> {
        let (start, end) = range.resolve()?;
        let page = payments::request(session, &self.code).await?;

        let mut result = Vec::new();
        for payment in page.history.values().flatten() {
            let paid_at = payment
                .datetime
                .unwrap_or_else(|| payment.date.and_time(NaiveTime::MIN));
            if start <= paid_at && paid_at <= end {
                result.push(payment.convert_to(vec![("paid_at", paid_at.to_raw())])?);
            }
        }
        Ok(result)
    }

    pub async fn last_payment(&self, session: &Session) -> Result<Option<Payment>> {
        let payments = self.payments(session, DateRange::all()).await?;
        Ok(payments.into_iter().max_by_key(|p| p.paid_at))
    }

    /// Readings within the range's dates, optionally limited to some meter codes
    pub async fn indications(
        &self,
        session: &Session,
        range: DateRange,
        meter_codes: &[&str],
    ) -> Result<Vec<Indication>> {
        let (start, end) = range.resolve()?;
        let (start, end) = (start.date(), end.date());
        let page = readings_history::request(session, &self.code).await?;

        let mut result = Vec::new();
        for dates in page.history.values() {
            for (taken_on, meters) in dates.range(start..=end) {
                for (meter, data) in meters {
                    if !meter_codes.is_empty() && !meter_codes.contains(&data.meter_code.as_str()) {
                        continue;
                    }
                    result.push(Indication {
                        meter_identifier: meter.clone(),
                        taken_on: *taken_on,
                        meter_code: data.meter_code.clone(),
                        status: data.status.unwrap_or(0),
                        zones: data
                            .readings
                            .iter()
                            .map(|(code, reading)| (normalize_zone_code(code), reading.value))
                            .collect(),
                    });
                }
            }
        }
        Ok(result)
    }

    /// Most recent reading, optionally of one meter
    pub async fn last_indication(
        &self,
        session: &Session,
        meter_code: Option<&str>,
    ) -> Result<Option<Indication>> {
        let codes: Vec<&str> = meter_code.into_iter().collect();
        let indications = self.indications(session, DateRange::all(), &codes).await?;
        Ok(indications.into_iter().max_by_key(|i| i.taken_on))
    }

    pub async fn main_page(&self, session: &Session) -> Result<MainPage> {
        main_page::request(session, &self.code).await
    }

    pub async fn digital_receipt_status(&self, session: &Session) -> Result<DigitalReceiptStatus> {
        digital_receipt::request(session, &self.code).await
    }

    pub async fn details(&self, session: &Session) -> Result<AccountDetails> {
        accounts::details(session, &self.code).await
    }
}

/// Meter of an account with its tariff zones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meter {
    #[serde(skip)]
    pub account: Account,
    pub identifier: String,
    pub code: String,
    pub can_delete: bool,
    pub checkup_date: Option<NaiveDate>,
    pub checkup_status: i64,
    pub checkup_url: Option<String>,
    pub last_checkup_date: Option<NaiveDate>,
    pub manufactured_date: Option<NaiveDate>,
    pub transmission_coefficient: f64,
    pub last_indications_date: Option<NaiveDate>,
    pub install_location: String,
    pub model: String,
    pub precision: i64,
    pub status: String,
    pub service_name: String,
    pub service_number: String,
    pub tariff_count: i64,
    pub r#type: i64,
    pub zones: BTreeMap<String, MeterZone>,
}

/// Zone values for one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readings {
    values: Vec<(String, i64)>,
    ignore_values: bool,
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn t1(self, value: i64) -> Self {
        self.zone("t1", value)
    }

    pub fn t2(self, value: i64) -> Self {
        self.zone("t2", value)
    }

    pub fn t3(self, value: i64) -> Self {
        self.zone("t3", value)
    }

    /// Set a zone by key; setting the same zone again replaces the value
    pub fn zone(mut self, key: impl Into<String>, value: i64) -> Self {
        let key = key.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
        self
    }

    /// Submit even when a value does not exceed the last known one
    pub fn ignore_values(mut self, ignore: bool) -> Self {
        self.ignore_values = ignore;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[(String, i64)] {
        &self.values
    }
}

impl Meter {
    /// Build from the zone rows of one meter; the first row supplies meter fields
    pub fn from_rows(account: &Account, identifier: &str, rows: &[ZoneData]) -> Result<Option<Self>> {
        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut zones = BTreeMap::new();
        for row in rows {
            let zone: MeterZone = row.convert_to(Vec::new())?;
            zones.insert(zone.key(), zone);
        }

        Ok(Some(Self {
            account: account.clone(),
            identifier: identifier.to_string(),
            code: first.code.clone(),
            can_delete: first.can_delete,
            checkup_date: first.checkup_date,
            checkup_status: first.checkup_status,
            checkup_url: first.checkup_url.clone(),
            last_checkup_date: first.last_checkup_date,
            manufactured_date: first.manufactured_date,
            transmission_coefficient: first.transmission_coefficient,
            last_indications_date: first.last_indications_date,
            install_location: first.install_location.clone(),
            model: first.model.clone(),
            precision: first.precision,
            status: first.status.clone(),
            service_name: first.service_name.clone(),
            service_number: first.service_number.clone(),
            tariff_count: first.zone_count,
            r#type: first.r#type,
            zones,
        }))
    }

    pub async fn indications(&self, session: &Session, range: DateRange) -> Result<Vec<Indication>> {
        self.account
            .indications(session, range, &[self.code.as_str()])
            .await
    }

    pub async fn last_indication(&self, session: &Session) -> Result<Option<Indication>> {
        self.account
            .last_indication(session, Some(self.code.as_str()))
            .await
    }

    /// Validate `readings` against the known zones without sending anything
    pub fn prepare_indications(&self, readings: &Readings) -> Result<Vec<NewIndication>> {
        if readings.is_empty() {
            return Err(Error::invalid_argument(format!(
                "no indications provided for meter {}",
                self.code
            )));
        }

        if let Some((unknown, _)) = readings
            .values()
            .iter()
            .find(|(key, _)| !self.zones.contains_key(key))
        {
            return Err(Error::invalid_argument(format!(
                "meter {} has no zone '{}' (known zones: {})",
                self.code,
                unknown,
                self.zones.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut indications = Vec::with_capacity(readings.values().len());
        for (key, value) in readings.values() {
            let zone = &self.zones[key];
            let last = zone.last_indication.unwrap_or(0);

            if !readings.ignore_values && *value <= last {
                return Err(Error::InvalidIndication {
                    zone: key.clone(),
                    value: *value,
                    last,
                });
            }

            indications.push(NewIndication {
                meter_code: self.code.clone(),
                value: *value,
                label: zone.label.clone(),
                index: zone.index,
                identifier: zone.identifier.clone(),
            });
        }
        Ok(indications)
    }

    pub async fn send_indications(
        &self,
        session: &Session,
        readings: &Readings,
    ) -> Result<SendReadingsResult> {
        let indications = self.prepare_indications(readings)?;
        info!(
            "submitting {} indication(s) for meter {}",
            indications.len(),
            self.code
        );
        send_readings::request(session, &self.account.code, &indications).await
    }
}

impl Session {
    /// Log in and expand the controlled accounts one level deep
    pub async fn authenticate(&self) -> Result<Login> {
        let response = authorization::request(self, self.username(), self.password()).await?;

        let account = Account::from_authorization(&response)?;
        let dependents = response
            .dependent_accounts
            .iter()
            .map(Account::from_info)
            .collect::<Result<Vec<_>>>()?;

        info!(
            "authenticated {} with {} dependent account(s)",
            account.code,
            dependents.len()
        );
        Ok(Login {
            account,
            dependents,
            response,
        })
    }

    /// Accounts reachable from `code` (the session's own account by default)
    pub async fn accounts(&self, code: Option<&str>) -> Result<Vec<Account>> {
        let code = code.unwrap_or(self.username());
        let list = accounts::list(self, code).await?;
        list.data.iter().map(Account::from_info).collect()
    }

    pub async fn account_info(&self, code: Option<&str>) -> Result<AccountDetails> {
        let code = code.unwrap_or(self.username());
        accounts::details(self, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::send_readings_page::fixtures::zone_row;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn account() -> Account {
        Account::from_response(&json!({"code": "760000000001", "debt": "-5"})).unwrap()
    }

    fn meter(last_t1: Value, last_t2: Value) -> Meter {
        let rows = vec![
            ZoneData::from_response(&zone_row("r1", 0, 1, last_t1)).unwrap(),
            ZoneData::from_response(&zone_row("r2", 1, 2, last_t2)).unwrap(),
        ];
        Meter::from_rows(&account(), "1001", &rows).unwrap().unwrap()
    }

    #[test]
    fn test_zone_code_normalization() {
        assert_eq!(normalize_zone_code("pik"), "t1");
        assert_eq!(normalize_zone_code("night"), "t2");
        assert_eq!(normalize_zone_code("ppik"), "t3");
        assert_eq!(normalize_zone_code("peak2"), "peak2");
    }

    #[test]
    fn test_process_start_end_defaults_and_order() {
        let (start, end) = process_start_end(None, None).unwrap();
        assert_eq!(start, NaiveDateTime::MIN);
        assert!(Local::now().naive_local() - end < Duration::seconds(5));

        let a = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_time(NaiveTime::MIN);
        let b = a + Duration::days(1);
        assert_eq!(process_start_end(Some(a), Some(b)).unwrap(), (a, b));
        assert!(matches!(
            process_start_end(Some(b), Some(a)),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_date_range_covers_whole_days() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 5).unwrap();
        let range = DateRange::dates(Some(day), Some(day));
        let (start, end) = range.resolve().unwrap();
        assert_eq!(start.date(), day);
        assert_eq!(end, day.and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn test_account_from_authorization_takes_invoice_settings() {
        let response = Authorization::from_response(&json!({
            "LS": "760000000001",
            "BALANCE": "10",
            "emailAndKvitStatus": {
                "ls": "760000000001",
                "kvit_email": "bills@example.com",
                "kvit_enabled": "1",
                "kvit_email_string": "monthly",
                "result": true
            },
            "has_ls_without_kvit": "0",
            "CONSENT": {"pd": "1", "digital": "1"},
            "checkEmailKvtParam": "0",
            "IS_ALLOW_DELEGATION": "0"
        }))
        .unwrap();

        let account = Account::from_authorization(&response).unwrap();
        assert_eq!(account.code, "760000000001");
        assert_eq!(account.balance(), -10.0);
        assert_eq!(account.digital_invoices_email.as_deref(), Some("bills@example.com"));
        assert!(account.digital_invoices_enabled);
        assert_eq!(account.digital_invoices_email_comment.as_deref(), Some("monthly"));
        assert_eq!(account.address, None);
    }

    #[test]
    fn test_account_from_info_falls_back_to_controlling_code() {
        let info = AccountInfo::from_response(&json!({
            "cache_address": "addr",
            "cache_balance": "1.5",
            "ignore_ekvit": "1",
            "kvit_enabled": "0",
            "is_slave_ls": "1",
            "is_master_ls": "0",
            "master_ls": "760000000001",
            "slave_ls": "760000000009"
        }))
        .unwrap();

        let account = Account::from_info(&info).unwrap();
        assert_eq!(account.code, "760000000009");
        assert_eq!(account.address.as_deref(), Some("addr"));
        assert_eq!(account.debt, 1.5);
        assert!(account.digital_invoices_ignored);
        assert!(account.is_controlled);
        assert_eq!(account.controlled_by_code.as_deref(), Some("760000000001"));
    }

    #[test]
    fn test_meter_from_rows() {
        let meter = meter(json!("1500"), json!(""));
        assert_eq!(meter.code, "12345");
        assert_eq!(meter.identifier, "1001");
        assert_eq!(meter.tariff_count, 2);
        assert_eq!(meter.zones.len(), 2);

        let t1 = &meter.zones["t1"];
        assert_eq!(t1.identifier, "r1");
        assert_eq!(t1.name.as_deref(), Some("Зона 1"));
        assert_eq!(t1.last_indication, Some(1500));
        assert_eq!(meter.zones["t2"].last_indication, None);

        assert!(Meter::from_rows(&account(), "1002", &[]).unwrap().is_none());
    }

    #[test]
    fn test_prepare_indications_checks_monotonicity() {
        let meter = meter(json!("1500"), Value::Null);

        let err = meter
            .prepare_indications(&Readings::new().t1(1500))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidIndication { ref zone, value: 1500, last: 1500 } if zone == "t1"
        ));

        let forced = meter
            .prepare_indications(&Readings::new().t1(1400).ignore_values(true))
            .unwrap();
        assert_eq!(forced[0].value, 1400);

        // absent last indication counts as zero
        assert!(meter.prepare_indications(&Readings::new().t2(0)).is_err());
        assert!(meter.prepare_indications(&Readings::new().t2(1)).is_ok());
    }

    #[test]
    fn test_prepare_indications_order_and_shape() {
        let meter = meter(json!("1500"), json!("700"));
        let prepared = meter
            .prepare_indications(&Readings::new().t2(800).t1(1600).t2(810))
            .unwrap();
        assert_eq!(
            prepared,
            vec![
                NewIndication {
                    meter_code: "12345".to_string(),
                    value: 810,
                    label: "label1".to_string(),
                    index: 1,
                    identifier: "r2".to_string(),
                },
                NewIndication {
                    meter_code: "12345".to_string(),
                    value: 1600,
                    label: "label0".to_string(),
                    index: 0,
                    identifier: "r1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_prepare_indications_rejects_unknown_and_empty() {
        let meter = meter(json!("1"), json!("1"));
        assert!(matches!(
            meter.prepare_indications(&Readings::new().t3(5)),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            meter.prepare_indications(&Readings::new().t1(5).zone("x", 5)),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            meter.prepare_indications(&Readings::new()),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
