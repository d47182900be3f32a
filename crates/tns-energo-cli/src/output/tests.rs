// Tests for output formatting
//
// Tables and summaries are rendered into an in-memory buffer so the exact
// text a user sees can be asserted.

use super::*;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tns_energo_core::{MeterZone, Record};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let output = OutputWriter::with_writer(format, false, false, Box::new(buffer.clone()));
    (output, buffer)
}

fn account(code: &str, debt: f64, controlled_by: Option<&str>) -> Account {
    Account::from_response(&json!({
        "code": code,
        "address": "г. Ярославль, ул. Свободы, 1",
        "debt": debt,
        "controlled_by_code": controlled_by,
        "digital_invoices_enabled": true,
        "digital_invoices_email": "bills@example.com"
    }))
    .unwrap()
}

fn zone(identifier: &str, index: i64, last: Option<i64>) -> MeterZone {
    MeterZone::from_response(&json!({
        "identifier": identifier,
        "index": index,
        "name": if index == 0 { "День" } else { "Ночь" },
        "last_indication": last,
        "max_indication_difference": 10000.0,
        "closing_indication": null,
        "label": format!("label{index}")
    }))
    .unwrap()
}

fn meter() -> Meter {
    let owner = account("760000000001", 0.0, None);
    let mut zones = BTreeMap::new();
    zones.insert("t1".to_string(), zone("r1", 0, Some(1500)));
    zones.insert("t2".to_string(), zone("r2", 1, None));

    Meter {
        account: owner,
        identifier: "1001".to_string(),
        code: "12345".to_string(),
        can_delete: false,
        checkup_date: None,
        checkup_status: 0,
        checkup_url: None,
        last_checkup_date: None,
        manufactured_date: None,
        transmission_coefficient: 1.0,
        last_indications_date: NaiveDate::from_ymd_opt(2021, 3, 10),
        install_location: "Квартира".to_string(),
        model: "Меркурий 200".to_string(),
        precision: 6,
        status: "Работает".to_string(),
        service_name: "Электроэнергия".to_string(),
        service_number: "1".to_string(),
        tariff_count: 2,
        r#type: 1,
        zones,
    }
}

#[test]
fn test_table_aligns_cyrillic_cells() {
    let (mut output, buffer) = writer(OutputFormat::Human);
    output
        .table(
            &["Zone", "Name"],
            vec![
                vec!["t1".to_string(), "День".to_string()],
                vec!["t2".to_string(), "Ночь".to_string()],
            ],
        )
        .unwrap();

    assert_eq!(
        buffer.text(),
        "Zone │ Name\n─────┼─────\nt1   │ День\nt2   │ Ночь\n"
    );
}

#[test]
fn test_machine_formats_skip_tables_and_messages() {
    let (mut output, buffer) = writer(OutputFormat::Json);
    output.info("logging in").unwrap();
    output.success("done").unwrap();
    output.table(&["A"], vec![vec!["1".to_string()]]).unwrap();
    output.data(&json!({"code": "760000000001"})).unwrap();

    assert_eq!(buffer.text(), "{\"code\":\"760000000001\"}\n");
}

#[test]
fn test_yaml_data() {
    let (mut output, buffer) = writer(OutputFormat::Yaml);
    output.data(&json!({"amount": 100.0})).unwrap();
    assert_eq!(buffer.text(), "amount: 100.0\n");
}

#[test]
fn test_plain_messages_without_color() {
    let (mut output, buffer) = writer(OutputFormat::Human);
    output.info("logging in").unwrap();
    output.warning("no meters").unwrap();
    output.section("Dependents").unwrap();

    assert_eq!(
        buffer.text(),
        "INFO: logging in\nWARNING: no meters\n\n=== Dependents ===\n"
    );
}

#[test]
fn test_key_values_are_aligned() {
    let (mut output, buffer) = writer(OutputFormat::Human);
    output
        .key_values(&[("Account", "760000000001".to_string()), ("Balance", "-250.75".to_string()), ("To pay", "1".to_string())])
        .unwrap();

    assert_eq!(
        buffer.text(),
        "Account  760000000001\nBalance  -250.75\nTo pay   1\n"
    );
}

#[test]
fn test_account_rows_and_summary() {
    let accounts = vec![
        account("760000000001", 250.75, None),
        account("760000000002", 0.0, Some("760000000001")),
    ];

    let rows = account_rows(&accounts);
    assert_eq!(rows[0][2], "-250.75");
    assert_eq!(rows[0][3], "-");
    assert_eq!(rows[1][3], "760000000001");

    let summary = account_summary(&accounts[0]);
    assert_eq!(summary[4], ("Digital invoices", "enabled (bills@example.com)".to_string()));
    assert_eq!(summary[3], ("Email", "-".to_string()));
}

#[test]
fn test_meter_rows_fill_meter_columns_once() {
    let mut meters = BTreeMap::new();
    meters.insert("12345".to_string(), meter());

    let rows = meter_rows(&meters);
    assert_eq!(
        rows,
        vec![
            vec!["12345", "Меркурий 200", "t1", "День", "1500", "10.03.2021"],
            vec!["", "", "t2", "Ночь", "-", ""],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(String::from).collect::<Vec<_>>())
        .collect::<Vec<_>>()
    );
}

#[test]
fn test_meter_serialization_skips_owner() {
    let value = serde_json::to_value(meter()).unwrap();
    assert!(value.get("account").is_none());
    assert_eq!(value["zones"]["t1"]["last_indication"], 1500);
}

#[test]
fn test_payment_rows_newest_first() {
    let payments = vec![
        Payment::from_response(&json!({
            "transaction_id": null,
            "paid_at": "20210115000000",
            "source": "Касса",
            "amount": 100.0
        }))
        .unwrap(),
        Payment::from_response(&json!({
            "transaction_id": "T-1",
            "paid_at": "20210201093000",
            "source": "Сбербанк",
            "amount": 250.5
        }))
        .unwrap(),
    ];

    let rows = payment_rows(&payments);
    assert_eq!(rows[0], vec!["01.02.2021 09:30", "250.50", "Сбербанк", "T-1"]);
    assert_eq!(rows[1][3], "-");
}

#[test]
fn test_indication_rows_join_zones() {
    let mut zones = BTreeMap::new();
    zones.insert("t1".to_string(), 1500);
    zones.insert("t2".to_string(), 700);

    let rows = indication_rows(&[Indication {
        meter_identifier: "1001".to_string(),
        taken_on: NaiveDate::from_ymd_opt(2021, 3, 10).unwrap(),
        meter_code: "12345".to_string(),
        status: 0,
        zones,
    }]);

    assert_eq!(rows, vec![vec!["10.03.2021", "12345", "0", "t1=1500, t2=700"]]);
}
