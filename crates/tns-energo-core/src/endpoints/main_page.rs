//! `getMainpage` action

use crate::convert;
use crate::endpoints::authorization::{email_and_invoice_status, EmailAndInvoiceStatus};
use crate::endpoints::require_body;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::mapping::Record;
use crate::session::{Session, Target};
use serde_json::Value;

pub const ACTION: &str = "getMainpage";

crate::record! {
    pub struct TicketsInfo {
        resolved: i64 = "resolved" => convert::integer_or_zero, default = 0;
        with_answer: i64 = "with_answer" => convert::integer_or_zero;
    }
}

fn tickets_info(value: &Value) -> Result<TicketsInfo> {
    TicketsInfo::from_response(value)
}

/// Raw objects of a list that is passed through untyped
fn value_list(value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.clone()),
        other => Err(Error::format(format!("expected a list, got {other}"))),
    }
}

crate::record! {
    /// `getMainpage` response
    pub struct MainPage {
        cost_of_restriction: f64 = "COST-OF-RESTRICTION" => convert::float, default = 0.0;
        cost_of_resuming: f64 = "COST-OF-RESUMING" => convert::float, default = 0.0;
        summ: f64 = "summ" => convert::float;
        email_invoice_status: EmailAndInvoiceStatus = "emailAndKvitStatus" => email_and_invoice_status;
        banners: Vec<Value> = "banners" => value_list, default = Vec::new();
        notifications: Vec<Value> = "notifications" => value_list;
        tickets_info: TicketsInfo = "ticketsInfo" => tickets_info;
    }
}

impl Envelope for MainPage {}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target(ACTION, code)
}

pub async fn request_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(target(session, code)).await
}

pub async fn request(session: &Session, code: &str) -> Result<MainPage> {
    let raw = require_body(request_raw(session, code).await?, ACTION)?;
    MainPage::from_envelope(&raw)
}
