//! `authorization` action

use crate::convert;
use crate::endpoints::accounts::{account_info_list, AccountInfo};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::mapping::Record;
use crate::session::{Session, Target};
use serde_json::{json, Value};

crate::record! {
    /// E-mail and digital invoice settings attached to an account
    pub struct EmailAndInvoiceStatus {
        code: String = "ls" => convert::string;
        email: Option<String> = "email" => convert::string_opt, default = None;
        digital_invoices_email: Option<String> = "kvit_email" => convert::string_opt, default = None;
        digital_invoices_enabled: bool = "kvit_enabled" => convert::boolean, default = false;
        digital_invoices_ignored: bool = "ignore_ekvit" => convert::boolean, default = false;
        digital_invoices_email_comment: Option<String> = "kvit_email_string" => convert::string_opt, default = None;
        result: bool = "result" => convert::boolean;
    }
}

pub(crate) fn email_and_invoice_status(value: &Value) -> Result<EmailAndInvoiceStatus> {
    EmailAndInvoiceStatus::from_response(value)
}

crate::record! {
    pub struct Consent {
        pd: bool = "pd" => convert::boolean;
        digital: bool = "digital" => convert::boolean;
    }
}

fn consent(value: &Value) -> Result<Consent> {
    Consent::from_response(value)
}

crate::record! {
    /// `authorization` response
    pub struct Authorization {
        code: String = "LS" => convert::string;
        is_controlled: bool = "IS_SLAVE" => convert::boolean, default = false;
        controlled_by_code: Option<String> = "MASTER_LS" => convert::string_opt, default = None;
        is_controlling: bool = "IS_MASTER" => convert::boolean, default = false;
        email: Option<String> = "EMAIL" => convert::string_opt, default = None;
        digital_invoices_ignored: bool = "ignore_ekvit" => convert::boolean, default = false;
        email_and_invoice_status: EmailAndInvoiceStatus = "emailAndKvitStatus" => email_and_invoice_status;
        address: Option<String> = "ADDRESS" => convert::string_opt, default = None;
        debt: f64 = "BALANCE" => convert::float_or_zero, default = 0.0;
        dependent_accounts: Vec<AccountInfo> = "SLAVE_LS_LIST" => account_info_list, default = Vec::new();
        has_account_without_invoices: bool = "has_ls_without_kvit" => convert::boolean;
        consent: Consent = "CONSENT" => consent;
        password_hash: Option<String> = "PWD" => convert::string_opt;
        status: Option<String> = "STATUS" => convert::string_opt;
        check_email_kvt_param: bool = "checkEmailKvtParam" => convert::boolean;
        company_name: Option<String> = "COMPANY_NAME" => convert::string_opt;
        is_allow_delegation: bool = "IS_ALLOW_DELEGATION" => convert::boolean;
    }
}

impl Envelope for Authorization {}

impl Authorization {
    pub fn balance(&self) -> f64 {
        -self.debt
    }

    pub fn digital_invoices_email(&self) -> Option<&str> {
        self.email_and_invoice_status.digital_invoices_email.as_deref()
    }

    pub fn digital_invoices_enabled(&self) -> bool {
        self.email_and_invoice_status.digital_invoices_enabled
    }

    pub fn digital_invoices_email_comment(&self) -> Option<&str> {
        self.email_and_invoice_status
            .digital_invoices_email_comment
            .as_deref()
    }
}

pub fn target(session: &Session) -> Target {
    Target::path([
        "region",
        session.region(),
        "action",
        "authorization",
        "json",
    ])
}

pub async fn request_raw(session: &Session, username: &str, password: &str) -> Result<Value> {
    let payload = json!({ "ls": username, "password": password });
    session.post(target(session), &payload, "data").await
}

pub async fn request(session: &Session, username: &str, password: &str) -> Result<Authorization> {
    Authorization::from_envelope(&request_raw(session, username, password).await?)
}
