//! Readings history and submission handlers

use super::utils::{connect, find_meter, with_spinner};
use crate::cli::{IndicationsArgs, SendArgs};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{indication_rows, submission_summary, OutputWriter, INDICATION_HEADERS};
use tns_energo_core::endpoints::send_readings;
use tns_energo_core::{DateRange, Readings, Session};
use tracing::{info, instrument};

/// Handle the indications command
#[instrument(skip_all, fields(account = ?args.account.account, meters = ?args.meter))]
pub async fn handle_indications(
    args: IndicationsArgs,
    session: &Session,
    output: &mut OutputWriter,
) -> Result<()> {
    if args.last && args.meter.len() > 1 {
        return Err(Error::invalid_args("--last accepts at most one --meter"));
    }

    let account = connect(session, output, args.account.account.as_deref()).await?;

    let indications = if args.last {
        let meter = args.meter.first().map(String::as_str);
        let last = with_spinner(
            output,
            "Loading readings...",
            account.last_indication(session, meter),
        )
        .await?;
        if !output.is_human() {
            return output.data(&last);
        }
        last.into_iter().collect::<Vec<_>>()
    } else {
        let range = DateRange::dates(args.start, args.end);
        let meters: Vec<&str> = args.meter.iter().map(String::as_str).collect();
        let indications = with_spinner(
            output,
            "Loading readings...",
            account.indications(session, range, &meters),
        )
        .await?;
        if !output.is_human() {
            return output.data(&indications);
        }
        indications
    };

    if indications.is_empty() {
        return output.warning("No readings found");
    }
    output.table(INDICATION_HEADERS, indication_rows(&indications))
}

fn readings_from(args: &SendArgs) -> Result<Readings> {
    let mut readings = Readings::new().ignore_values(args.ignore_values);

    for (key, value) in [("t1", args.t1), ("t2", args.t2), ("t3", args.t3)] {
        if let Some(value) = value {
            readings = readings.zone(key, value);
        }
    }
    for (key, value) in &args.zone {
        readings = readings.zone(key.as_str(), *value);
    }

    if readings.is_empty() {
        return Err(Error::invalid_args(
            "no readings given; use --t1/--t2/--t3 or --zone ZONE=VALUE",
        ));
    }
    Ok(readings)
}

/// Handle the send command
#[instrument(skip_all, fields(account = ?args.account.account, meter = %args.meter))]
pub async fn handle_send(args: SendArgs, session: &Session, output: &mut OutputWriter) -> Result<()> {
    let readings = readings_from(&args)?;

    let account = connect(session, output, args.account.account.as_deref()).await?;
    let meters = with_spinner(output, "Loading meters...", account.meters(session)).await?;
    let meter = find_meter(&meters, &args.meter)?;

    // Validation runs before any submission
    let prepared = meter.prepare_indications(&readings)?;

    if args.dry_run {
        let payload = send_readings::payload(&prepared)?;
        if !output.is_human() {
            return output.data(&payload);
        }
        output.info(&format!(
            "Dry run: {} reading(s) for meter {} not submitted",
            prepared.len(),
            meter.code
        ))?;
        let rows = prepared
            .iter()
            .map(|p| vec![format!("t{}", p.index + 1), p.value.to_string(), p.identifier.clone()])
            .collect();
        return output.table(&["Zone", "Value", "Row"], rows);
    }

    let _timer = Timer::with_details("send_readings", &meter.code);
    let result = with_spinner(
        output,
        "Submitting readings...",
        meter.send_indications(session, &readings),
    )
    .await?;
    info!(meter = %meter.code, count = prepared.len(), "readings accepted");

    if !output.is_human() {
        return output.data(&result);
    }

    output.success(&format!("✓ Readings for meter {} accepted", meter.code))?;
    output.key_values(&submission_summary(&result.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AccountArgs, OutputFormat};
    use crate::handlers::testing::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn send_args(t1: Option<i64>, t2: Option<i64>) -> SendArgs {
        SendArgs {
            account: AccountArgs::default(),
            meter: "12345".to_string(),
            t1,
            t2,
            t3: None,
            zone: Vec::new(),
            ignore_values: false,
            dry_run: false,
        }
    }

    fn transport() -> ScriptedTransport {
        ScriptedTransport::new()
            .respond("authorization", authorization())
            .respond("getSendReadingsPage", send_readings_page())
            .respond("getReadingsHistPage", readings_history())
            .respond("sendReadings", send_readings_result())
    }

    #[test]
    fn test_readings_from_flags() {
        let mut args = send_args(Some(1520), None);
        args.zone = vec![("t1".to_string(), 1600), ("t3".to_string(), 40)];
        args.ignore_values = true;

        let readings = readings_from(&args).unwrap();
        assert_eq!(
            readings.values(),
            &[("t1".to_string(), 1600), ("t3".to_string(), 40)]
        );

        assert!(matches!(
            readings_from(&send_args(None, None)),
            Err(Error::InvalidArgs(_))
        ));
    }

    #[tokio::test]
    async fn test_send_submits_and_reports_balance() {
        let transport = transport();
        let (mut output, sink) = capture();

        handle_send(send_args(Some(1520), Some(720)), &transport.session(), &mut output)
            .await
            .unwrap();

        let submission = transport.sent().into_iter().last().unwrap();
        let body: Value = serde_json::from_str(&submission.form.unwrap().content).unwrap();
        assert_eq!(body[0]["newPok"], "1520");
        assert_eq!(body[1]["rowID"], "r2");

        let text = sink.text();
        assert!(text.contains("✓ Readings for meter 12345 accepted"));
        assert!(text.contains("To pay            120.00"));
    }

    #[tokio::test]
    async fn test_send_rejects_stale_values_without_submitting() {
        let transport = transport();
        let (mut output, _) = capture();

        let err = handle_send(send_args(Some(1500), None), &transport.session(), &mut output)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(tns_energo_core::Error::InvalidIndication { last: 1500, .. })
        ));
        assert_eq!(err.exit_code(), 15);
        assert!(!transport
            .sent()
            .iter()
            .any(|r| r.url.contains("/action/sendReadings/")));
    }

    #[tokio::test]
    async fn test_send_dry_run_prints_payload() {
        let transport = transport();
        let (mut output, sink) = capture_as(OutputFormat::Json);
        let mut args = send_args(Some(1520), None);
        args.dry_run = true;

        handle_send(args, &transport.session(), &mut output).await.unwrap();

        assert_eq!(
            sink.json(),
            json!([{"counterNumber": "12345", "newPok": "1520", "label": "label0", "nomerTarifa": "0", "rowID": "r1"}])
        );
        assert!(!transport
            .sent()
            .iter()
            .any(|r| r.url.contains("/action/sendReadings/")));
    }

    #[tokio::test]
    async fn test_send_unknown_meter() {
        let transport = transport();
        let (mut output, _) = capture();
        let mut args = send_args(Some(1520), None);
        args.meter = "00000".to_string();

        match handle_send(args, &transport.session(), &mut output).await {
            Err(Error::MeterNotFound { available, .. }) => assert_eq!(available, "12345"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_indications_table_and_last() {
        let transport = transport();
        let session = transport.session();

        let (mut output, sink) = capture();
        handle_indications(
            IndicationsArgs {
                account: AccountArgs::default(),
                start: None,
                end: None,
                meter: vec!["12345".to_string()],
                last: false,
            },
            &session,
            &mut output,
        )
        .await
        .unwrap();
        let text = sink.text();
        assert!(text.contains("10.02.2021 │ 12345 │ 1      │ t1=1400, t2=650"));
        assert!(text.contains("10.03.2021 │ 12345 │ 0      │ t1=1500, t2=700"));

        let (mut output, sink) = capture_as(OutputFormat::Json);
        handle_indications(
            IndicationsArgs {
                account: AccountArgs::default(),
                start: None,
                end: None,
                meter: Vec::new(),
                last: true,
            },
            &session,
            &mut output,
        )
        .await
        .unwrap();
        assert_eq!(sink.json()["taken_on"], "2021-03-10");
    }

    #[tokio::test]
    async fn test_last_with_several_meters_is_rejected() {
        let (mut output, _) = capture();
        let err = handle_indications(
            IndicationsArgs {
                account: AccountArgs::default(),
                start: None,
                end: None,
                meter: vec!["1".to_string(), "2".to_string()],
                last: true,
            },
            &transport().session(),
            &mut output,
        )
        .await
        .unwrap_err();
        assert!(err.should_show_help());
    }
}
