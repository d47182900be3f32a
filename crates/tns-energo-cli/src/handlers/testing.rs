//! Scripted transport and fixtures for handler tests

use crate::cli::OutputFormat;
use crate::output::OutputWriter;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tns_energo_core::{RawResponse, Session, Transport, TransportError, TransportRequest};

pub const USERNAME: &str = "760000000001";
pub const DEPENDENT: &str = "760000000002";
pub const PASSWORD: &str = "secret";

/// Transport answering by URL substring and recording every request
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<Vec<(String, u16, String)>>>,
    sent: Arc<Mutex<Vec<TransportRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, marker: &str, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((marker.to_string(), 200, body.to_string()));
        self
    }

    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn session(&self) -> Session {
        Session::builder(USERNAME, PASSWORD)
            .transport(self.clone())
            .build()
            .expect("session should build")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: &TransportRequest,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());

        let routes = self.routes.lock().unwrap();
        match routes.iter().find(|(marker, _, _)| request.url.contains(marker.as_str())) {
            Some((_, status, body)) => Ok(RawResponse::new(*status, body.clone())),
            None => Ok(RawResponse::new(404, format!("no route for {}", request.url))),
        }
    }
}

/// In-memory sink for [`OutputWriter`]
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text()).unwrap()
    }
}

pub fn capture() -> (OutputWriter, Captured) {
    capture_as(OutputFormat::Human)
}

pub fn capture_as(format: OutputFormat) -> (OutputWriter, Captured) {
    let sink = Captured::default();
    let output = OutputWriter::with_writer(format, false, false, Box::new(sink.clone()));
    (output, sink)
}

pub fn account_info(code: &str) -> Value {
    json!({
        "cache_address": "г. Ярославль, ул. Свободы, 2",
        "cache_balance": "15",
        "ls": code,
        "email": null,
        "ignore_ekvit": "0",
        "kvit_email": null,
        "kvit_enabled": "0",
        "is_slave_ls": "1",
        "is_master_ls": "0",
        "master_ls": USERNAME
    })
}

pub fn authorization() -> Value {
    json!({
        "result": true,
        "LS": USERNAME,
        "IS_MASTER": "1",
        "EMAIL": "user@example.com",
        "emailAndKvitStatus": {
            "ls": USERNAME,
            "kvit_email": "bills@example.com",
            "kvit_enabled": "1",
            "result": true
        },
        "ADDRESS": "г. Ярославль, ул. Свободы, 1",
        "BALANCE": "-250.75",
        "SLAVE_LS_LIST": [account_info(DEPENDENT)],
        "has_ls_without_kvit": "0",
        "CONSENT": {"pd": "1", "digital": "1"},
        "PWD": "hash",
        "STATUS": "active",
        "checkEmailKvtParam": "0",
        "COMPANY_NAME": "ТНС энерго Ярославль",
        "IS_ALLOW_DELEGATION": "1"
    })
}

pub fn account_list(codes: &[&str]) -> Value {
    json!({
        "result": true,
        "data": codes.iter().map(|code| account_info(code)).collect::<Vec<_>>(),
        "email": "user@example.com",
        "is_slave": "0",
        "is_master": "1",
        "kvit_enabled": "0",
        "has_ls_without_kvit": "1"
    })
}

fn zone_row(row_id: &str, index: i64, last: &str) -> Value {
    json!({
        "RowID": row_id,
        "NomerTarifa": index.to_string(),
        "NazvanieTarifa": if index == 0 { "День" } else { "Ночь" },
        "PredPok": last,
        "KoefTrans": "1",
        "MaxPok": "10000",
        "Type": "1",
        "Can_delete": "0",
        "zakrPok": null,
        "Label": format!("label{index}"),
        "sort": (index + 1).to_string(),
        "DatePoverStatus": "0",
        "DatePover": "01.01.2030",
        "RaschSch": "Работает",
        "MestoUst": "Квартира",
        "GodVipuska": "01.01.18",
        "ModelPU": "Меркурий 200",
        "Tarifnost": "2",
        "DatePok": "10.03.21",
        "NomerUslugi": "1",
        "NazvanieUslugi": "Электроэнергия",
        "ZavodNomer": "12345",
        "Razradnost": "6"
    })
}

pub fn send_readings_page() -> Value {
    json!({
        "result": true,
        "STATUS": "",
        "counters": {
            "1001": [zone_row("r2", 1, "700"), zone_row("r1", 0, "1500")]
        }
    })
}

pub fn readings_history() -> Value {
    json!({
        "result": true,
        "history": {
            "2021": {
                "10.02.21": {
                    "1001": {
                        "number": "12345",
                        "status": "1",
                        "readings": {
                            "pik": {"label": "День", "value": "1400"},
                            "night": {"label": "Ночь", "value": "650"}
                        }
                    }
                },
                "10.03.21": {
                    "1001": {
                        "number": "12345",
                        "status": "0",
                        "readings": {
                            "pik": {"label": "День", "value": "1500"},
                            "night": {"label": "Ночь", "value": "700"}
                        }
                    }
                }
            }
        }
    })
}

pub fn payments_page() -> Value {
    json!({
        "result": true,
        "history": {
            "2021": [
                {"DATE": "15.03.21", "DATETIME": "", "ISTOCHNIK": "Касса", "SUMMA": "100", "TRANSACTION": ""}
            ],
            "2020": [
                {"DATE": "20.12.20", "DATETIME": "20201220180000", "ISTOCHNIK": "Сбербанк", "SUMMA": "300", "TRANSACTION": "T-0"}
            ]
        }
    })
}

pub fn send_readings_result() -> Value {
    json!({
        "result": true,
        "data": {
            "ВХСАЛЬДО": "0", "ЗАДОЛЖЕННОСТЬ": "0", "ЗАДОЛЖЕННОСТЬОТКЛ": "0",
            "ЗАДОЛЖЕННОСТЬПЕНИ": "0", "ЗАДОЛЖЕННОСТЬПОДКЛ": "0",
            "ЗАКРЫТЫЙМЕСЯЦ": "01.03.2021", "НАЧИСЛЕНОПОИПУ": "120", "ПЕРЕРАСЧЕТ": "0",
            "ПРОГНОЗПОИПУ": "0", "СУМАПОТЕРИ": "0", "СУММАКОПЛАТЕ": "120",
            "СУММАОДНПРОГНОЗ": "0", "СУММАПЕНИПРОГНОЗ": "0", "СУММАПЛАТЕЖЕЙ": "0",
            "СУММАПРОГНОЗНАЧ": "0", "ФНАЧИСЛЕНОПОИПУ": "1", "KOPLATEPSEVDO": "0"
        }
    })
}

pub fn account_details() -> Value {
    json!({
        "result": true,
        "ADDRESS": "г. Ярославль, ул. Свободы, 1",
        "TELNANIMATEL": "+7 900 000-00-00",
        "CHISLOPROPISAN": "2",
        "OBSCHPLOSCHAD": "54.3",
        "JILPLOSCHAD": "",
        "DOCSOBSTV": null,
        "KATEGJIL": "Квартира",
        "SN_KOEFSEZON": null,
        "SN_OBJEM": null,
        "DIGITAL_RECEIPT": "1",
        "counters": []
    })
}
