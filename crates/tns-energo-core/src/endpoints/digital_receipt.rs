//! `getDigitalReceiptStatus` action

use crate::convert;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::session::{Session, Target};
use chrono::NaiveDate;
use serde_json::Value;

crate::record! {
    /// Digital invoice subscription of an account
    pub struct DigitalReceiptStatus {
        send_invoices: bool = "sendKvt" => convert::boolean, default = false;
        email_verification_required: bool = "EMAILVERIFY" => convert::boolean, default = false;
        profile_email: Option<String> = "registeredEmail" => convert::string_opt, default = None;
        invoices_email: Option<String> = "sendKvtEmail" => convert::string_opt, default = None;
        active_since: Option<NaiveDate> = "sendKvtEmailFrom" => convert::date_opt, default = None;
        active_until: Option<NaiveDate> = "sendKvtEmailTo" => convert::date_opt, default = None;
    }
}

impl Envelope for DigitalReceiptStatus {}

pub fn target(session: &Session, code: &str) -> Target {
    session.action_target("getDigitalReceiptStatus", code)
}

pub async fn request_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(target(session, code)).await
}

pub async fn request(session: &Session, code: &str) -> Result<DigitalReceiptStatus> {
    DigitalReceiptStatus::from_envelope(&request_raw(session, code).await?)
}
