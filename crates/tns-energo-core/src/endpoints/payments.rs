//! `getPaymentsHistPage` action

use crate::convert;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::mapping::{nested_list, object_of};
use crate::session::{Session, Target};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

crate::record! {
    /// One payment as listed in the history
    pub struct PaymentData {
        date: NaiveDate = "DATE" => convert::date;
        datetime: Option<NaiveDateTime> = "DATETIME" => convert::datetime_opt;
        source: String = "ISTOCHNIK" => convert::string;
        amount: f64 = "SUMMA" => convert::float;
        transaction_id: Option<String> = "TRANSACTION" => convert::string_opt;
    }
}

/// Payments per year, each list ascending by date then time
pub type PaymentHistory = BTreeMap<String, Vec<PaymentData>>;

fn history(value: &Value) -> Result<PaymentHistory> {
    let Some(years) = object_of(value, "payment history")? else {
        return Ok(BTreeMap::new());
    };

    years
        .iter()
        .map(|(year, payments)| {
            let mut payments: Vec<PaymentData> = nested_list(payments)?;
            payments.sort_by_key(|p| (p.date, p.datetime));
            Ok((year.clone(), payments))
        })
        .collect()
}

crate::record! {
    /// `getPaymentsHistPage` response
    pub struct PaymentsPage {
        result: bool = "result" => convert::boolean;
        history: PaymentHistory = "history" => history;
    }
}

impl Envelope for PaymentsPage {}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target("getPaymentsHistPage", code)
}

pub async fn request_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(target(session, code)).await
}

pub async fn request(session: &Session, code: &str) -> Result<PaymentsPage> {
    PaymentsPage::from_envelope(&request_raw(session, code).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mapping::{Record, ToRaw};
    use serde_json::json;

    fn payment(date: &str, datetime: Value, amount: &str) -> Value {
        json!({
            "DATE": date,
            "DATETIME": datetime,
            "ISTOCHNIK": " Сбербанк ",
            "SUMMA": amount,
            "TRANSACTION": null
        })
    }

    #[test]
    fn test_history_sorted_by_date_then_time() {
        let raw = json!({
            "result": true,
            "history": {
                "2021": [
                    payment("10.03.21", json!("20210310120000"), "3"),
                    payment("01.02.21", json!("20210201090000"), "2"),
                    payment("10.03.21", Value::Null, "1"),
                ]
            }
        });
        let page = PaymentsPage::from_envelope(&raw).unwrap();
        let amounts: Vec<f64> = page.history["2021"].iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![2.0, 1.0, 3.0]);
        assert_eq!(page.history["2021"][0].source, "Сбербанк");
    }

    #[test]
    fn test_history_tolerates_empty_and_rejects_scalars() {
        for empty in [json!([]), json!({}), Value::Null] {
            let page = PaymentsPage::from_envelope(&json!({"result": true, "history": empty}))
                .unwrap();
            assert!(page.history.is_empty());
        }
        assert!(matches!(
            PaymentsPage::from_envelope(&json!({"result": true, "history": "x"})),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_payment_canonical_form_is_accepted_back() {
        let original = PaymentData::from_response(&payment(
            "05.03.21",
            json!("20210305101500"),
            "150.5",
        ))
        .unwrap();
        let copy = PaymentData::from_response(&original.to_raw()).unwrap();
        assert_eq!(copy, original);
    }
}
