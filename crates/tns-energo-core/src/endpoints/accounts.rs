//! `getInfo` and `delegation/getLSListByLs`

use crate::convert;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::mapping::nested_list;
use crate::session::{Session, Target};
use serde_json::{json, Value};

crate::record! {
    /// Account entry of a list query or of the dependent accounts list
    pub struct AccountInfo {
        address: String = "cache_address" => convert::string;
        debt: f64 = "cache_balance" => convert::float_or_zero;
        code: Option<String> = "ls" => convert::string_opt, default = None;
        email: Option<String> = "email" => convert::string_opt;
        digital_invoices_ignored: bool = "ignore_ekvit" => convert::boolean;
        digital_invoices_email: Option<String> = "kvit_email" => convert::string_opt;
        digital_invoices_enabled: bool = "kvit_enabled" => convert::boolean;
        digital_invoices_email_comment: Option<String> = "kvit_email_string" => convert::string_opt, default = None;
        is_controlled: bool = "is_slave_ls" => convert::boolean;
        is_controlling: bool = "is_master_ls" => convert::boolean;
        controlled_by_code: Option<String> = "master_ls" => convert::string_opt;
        alias: Option<String> = "alias" => convert::string_opt, default = None;
        controlling_code: Option<String> = "slave_ls" => convert::string_opt, default = None;
        is_locked: bool = "is_locked" => convert::boolean, default = false;
        avatar_type: Option<i64> = "avatar_type" => convert::integer_opt, default = None;
    }
}

impl AccountInfo {
    pub fn balance(&self) -> f64 {
        -self.debt
    }
}

pub(crate) fn account_info_list(value: &Value) -> Result<Vec<AccountInfo>> {
    nested_list(value)
}

crate::record! {
    /// Meter summary of the account details page
    pub struct MeterDescription {
        install_location: String = "MestoUst" => convert::string;
        status: String = "RaschSch" => convert::string;
        code: String = "ZavodNomer" => convert::string;
    }
}

fn meter_descriptions(value: &Value) -> Result<Vec<MeterDescription>> {
    nested_list(value)
}

crate::record! {
    /// `getInfo` response
    pub struct AccountDetails {
        address: String = "ADDRESS" => convert::string;
        contact: Option<String> = "TELNANIMATEL" => convert::string_opt;
        people_registered: i64 = "CHISLOPROPISAN" => convert::integer_or_zero;
        total_area: Option<f64> = "OBSCHPLOSCHAD" => convert::float_opt;
        living_area: Option<f64> = "JILPLOSCHAD" => convert::float_opt;
        ownership_document: Option<String> = "DOCSOBSTV" => convert::string_opt;
        living_category: Option<String> = "KATEGJIL" => convert::string_opt;
        sn_koefsezon: Option<i64> = "SN_KOEFSEZON" => convert::integer_opt;
        sn_objem: Option<i64> = "SN_OBJEM" => convert::integer_opt;
        invoice_is_digital: bool = "DIGITAL_RECEIPT" => convert::boolean;
        meters: Vec<MeterDescription> = "counters" => meter_descriptions, default = Vec::new();
    }
}

impl Envelope for AccountDetails {}

pub fn details_target(session: &Session, code: &str) -> Target {
    session.action_target("getInfo", code)
}

pub async fn details_raw(session: &Session, code: &str) -> Result<Value> {
    session.get(details_target(session, code)).await
}

pub async fn details(session: &Session, code: &str) -> Result<AccountDetails> {
    AccountDetails::from_envelope(&details_raw(session, code).await?)
}

crate::record! {
    /// `getLSListByLs` response
    pub struct AccountList {
        data: Vec<AccountInfo> = "data" => account_info_list;
        email: Option<String> = "email" => convert::string_opt;
        is_controlled: bool = "is_slave" => convert::boolean;
        is_controlling: bool = "is_master" => convert::boolean;
        digital_invoices_enabled: bool = "kvit_enabled" => convert::boolean;
        has_account_without_invoices: bool = "has_ls_without_kvit" => convert::boolean;
    }
}

impl Envelope for AccountList {}

pub fn list_target(code: &str) -> Target {
    Target::path(["delegation", "getLSListByLs", code])
}

pub async fn list_raw(session: &Session, code: &str, dlogin: i64) -> Result<Value> {
    let payload = json!({ "for_ls": code, "dlogin": dlogin });
    session.post(list_target(code), &payload, "data").await
}

pub async fn list(session: &Session, code: &str) -> Result<AccountList> {
    AccountList::from_envelope(&list_raw(session, code, 0).await?)
}
