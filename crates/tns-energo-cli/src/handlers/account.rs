//! Account-level command handlers

use super::utils::{connect, login, with_spinner};
use crate::cli::{AccountArgs, PaymentsArgs};
use crate::error::Result;
use crate::output::{
    account_rows, account_summary, details_summary, meter_rows, payment_rows, OutputWriter,
    ACCOUNT_HEADERS, METER_HEADERS, PAYMENT_HEADERS,
};
use serde::Serialize;
use tns_energo_core::{Account, DateRange, Session};
use tracing::instrument;

#[derive(Serialize)]
struct LoginSummary<'a> {
    region: &'a str,
    company_name: Option<&'a str>,
    account: &'a Account,
    dependents: &'a [Account],
}

/// Handle the login command
#[instrument(skip_all)]
pub async fn handle_login(session: &Session, output: &mut OutputWriter) -> Result<()> {
    let login = login(session, output).await?;
    let company_name = login.response.company_name.as_deref();

    if !output.is_human() {
        return output.data(&LoginSummary {
            region: session.region(),
            company_name,
            account: &login.account,
            dependents: &login.dependents,
        });
    }

    output.success(&format!("✓ Logged in as {}", login.account.code))?;

    let mut summary = account_summary(&login.account);
    summary.push(("Region", session.region().to_string()));
    if let Some(company) = company_name {
        summary.push(("Company", company.to_string()));
    }
    output.key_values(&summary)?;

    if !login.dependents.is_empty() {
        output.section("Dependent accounts")?;
        output.table(ACCOUNT_HEADERS, account_rows(&login.dependents))?;
    }

    Ok(())
}

/// Handle the accounts command
#[instrument(skip_all)]
pub async fn handle_accounts(session: &Session, output: &mut OutputWriter) -> Result<()> {
    login(session, output).await?;
    let accounts = with_spinner(output, "Loading accounts...", session.accounts(None)).await?;

    if output.is_human() {
        output.table(ACCOUNT_HEADERS, account_rows(&accounts))
    } else {
        output.data(&accounts)
    }
}

/// Handle the info command
#[instrument(skip_all, fields(account = ?args.account))]
pub async fn handle_info(
    args: AccountArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let account = connect(session, output, args.account.as_deref()).await?;
    let details = with_spinner(output, "Loading account details...", account.details(session)).await?;

    if !output.is_human() {
        return output.data(&details);
    }

    output.key_values(&details_summary(&details))?;
    Ok(())
}

/// Handle the meters command
#[instrument(skip_all, fields(account = ?args.account))]
pub async fn handle_meters(
    args: AccountArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let account = connect(session, output, args.account.as_deref()).await?;
    let meters = with_spinner(output, "Loading meters...", account.meters(session)).await?;

    if !output.is_human() {
        return output.data(&meters);
    }

    if meters.is_empty() {
        return output.warning(&format!("No meters registered for {}", account.code));
    }
    output.table(METER_HEADERS, meter_rows(&meters))
}

/// Handle the payments command
#[instrument(skip_all, fields(account = ?args.account.account))]
pub async fn handle_payments(
    args: PaymentsArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    let account = connect(session, output, args.account.account.as_deref()).await?;

    let payments = if args.last {
        let last = with_spinner(output, "Loading payments...", account.last_payment(session)).await?;
        if !output.is_human() {
            return output.data(&last);
        }
        last.into_iter().collect::<Vec<_>>()
    } else {
        let range = DateRange::dates(args.start, args.end);
        let payments =
            with_spinner(output, "Loading payments...", account.payments(session, range)).await?;
        if !output.is_human() {
            return output.data(&payments);
        }
        payments
    };

    if payments.is_empty() {
        return output.warning("No payments found");
    }
    output.table(PAYMENT_HEADERS, payment_rows(&payments))
}
