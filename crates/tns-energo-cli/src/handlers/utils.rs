//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use std::collections::BTreeMap;
use std::future::Future;
use tns_energo_core::{Account, Login, Meter, Session};
use tracing::{debug, info};

/// Build a session from flags, environment and config file
pub fn open_session(
    username: Option<&str>,
    password: Option<&str>,
    config: &Config,
) -> Result<Session> {
    let (username, password) = config.credentials(username, password)?;
    let session = config.session_builder(&username, &password)?.build()?;
    debug!(region = session.region(), "session opened");
    Ok(session)
}

/// Await `work` behind a spinner when the terminal allows one
pub async fn with_spinner<T>(
    output: &OutputWriter,
    message: &str,
    work: impl Future<Output = T>,
) -> T {
    let spinner = output.spinner(message);
    let result = work.await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result
}

pub async fn login(session: &Session, output: &OutputWriter) -> Result<Login> {
    let _timer = Timer::with_details("login", session.username());
    let login = with_spinner(output, "Logging in...", session.authenticate()).await?;
    info!(
        account = %login.account.code,
        dependents = login.dependents.len(),
        "logged in"
    );
    Ok(login)
}

/// The logged-in account or one of its dependents
pub fn pick_account(login: &Login, code: Option<&str>) -> Option<Account> {
    match code {
        None => Some(login.account.clone()),
        Some(code) if code == login.account.code => Some(login.account.clone()),
        Some(code) => login.dependents.iter().find(|a| a.code == code).cloned(),
    }
}

/// Log in and select the account named by `--account`
///
/// Codes missing from the login dependents are looked up in the
/// delegation list before giving up.
pub async fn connect(
    session: &Session,
    output: &OutputWriter,
    code: Option<&str>,
) -> Result<Account> {
    let login = login(session, output).await?;

    if let Some(account) = pick_account(&login, code) {
        return Ok(account);
    }

    let code = code.unwrap_or_default();
    let listed = with_spinner(output, "Loading accounts...", session.accounts(None)).await?;
    listed
        .into_iter()
        .find(|a| a.code == code)
        .ok_or_else(|| Error::AccountNotFound {
            code: code.to_string(),
        })
}

pub fn find_meter<'a>(meters: &'a BTreeMap<String, Meter>, code: &str) -> Result<&'a Meter> {
    meters.get(code).ok_or_else(|| Error::MeterNotFound {
        code: code.to_string(),
        available: if meters.is_empty() {
            "none".to_string()
        } else {
            meters.keys().cloned().collect::<Vec<_>>().join(", ")
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;

    #[tokio::test]
    async fn test_pick_account() {
        let transport = ScriptedTransport::new().respond("authorization", authorization());
        let login = transport.session().authenticate().await.unwrap();

        assert_eq!(pick_account(&login, None).unwrap().code, USERNAME);
        assert_eq!(pick_account(&login, Some(USERNAME)).unwrap().code, USERNAME);
        assert_eq!(
            pick_account(&login, Some(DEPENDENT)).unwrap().controlled_by_code.as_deref(),
            Some(USERNAME)
        );
        assert!(pick_account(&login, Some("760000000099")).is_none());
    }

    #[tokio::test]
    async fn test_connect_falls_back_to_delegation_list() {
        let transport = ScriptedTransport::new()
            .respond("authorization", authorization())
            .respond("getLSListByLs", account_list(&[USERNAME, "760000000077"]));
        let session = transport.session();
        let (output, _) = capture();

        let account = connect(&session, &output, Some("760000000077")).await.unwrap();
        assert_eq!(account.code, "760000000077");

        let missing = connect(&session, &output, Some("760000000099")).await;
        assert!(matches!(missing, Err(Error::AccountNotFound { .. })));
    }

    #[test]
    fn test_open_session_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            open_session(None, Some("secret"), &config),
            Err(Error::MissingCredentials { what: "username" })
        ));
        assert!(matches!(
            open_session(Some("990000000001"), Some("secret"), &config),
            Err(Error::Core(tns_energo_core::Error::Configuration { .. }))
        ));
    }

    #[test]
    fn test_find_meter_lists_available_codes() {
        let meters = BTreeMap::new();
        match find_meter(&meters, "12345") {
            Err(Error::MeterNotFound { available, .. }) => assert_eq!(available, "none"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
