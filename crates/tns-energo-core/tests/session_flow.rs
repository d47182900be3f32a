//! Session-level request and failure handling


use serde_json::json;
use test_support::*;
use tns_energo_core::endpoints::{digital_receipt, main_page};
use tns_energo_core::{Error, Session};

#[tokio::test]
async fn test_every_request_carries_the_hash() {
    let transport = ScriptedTransport::new().respond(
        "getDigitalReceiptStatus",
        json!({"result": true, "sendKvt": "1"}),
    );
    let session = Session::builder(USERNAME, PASSWORD)
        .hash("custom-hash")
        .app_version("1.99")
        .transport(transport.clone())
        .build()
        .unwrap();

    let status = digital_receipt::request(&session, USERNAME).await.unwrap();
    assert!(status.send_invoices);

    let sent = transport.sent();
    assert_eq!(
        sent[0].query,
        vec![("hash".to_string(), "custom-hash".to_string())]
    );
    assert!(sent[0]
        .url
        .starts_with("https://rest.tns-e.ru/version/1.99/Android/mobile/"));
}

#[tokio::test]
async fn test_main_page_empty_body() {
    let transport = ScriptedTransport::new().respond_raw("getMainpage", 200, "");
    let session = transport.session();
    assert!(matches!(
        main_page::request(&session, USERNAME).await,
        Err(Error::EmptyResult { action: "getMainpage" })
    ));
}

#[tokio::test]
async fn test_transport_failures_are_classified() {
    let transport = ScriptedTransport::new()
        .time_out("getMainpage")
        .fail("getInfo", "dns failure")
        .respond_raw("getPaymentsHistPage", 502, "bad gateway")
        .respond_raw("getDigitalReceiptStatus", 200, "not json");
    let session = transport.session();

    let timeout = main_page::request(&session, USERNAME).await.unwrap_err();
    assert!(timeout.is_timeout());

    let failed = session.account_info(None).await.unwrap_err();
    assert!(matches!(failed, Error::Request { .. }));
    assert!(failed.is_request_error());

    let bad_status = tns_energo_core::endpoints::payments::request(&session, USERNAME)
        .await
        .unwrap_err();
    assert!(matches!(
        bad_status,
        Error::InvalidResponse { status: Some(502), .. }
    ));

    let not_json = digital_receipt::request(&session, USERNAME).await.unwrap_err();
    assert!(not_json.is_response_error());
}

#[test]
fn test_unknown_region_is_a_configuration_error() {
    let transport = ScriptedTransport::new();
    let err = Session::builder("990000000001", PASSWORD)
        .transport(transport.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(transport.sent().is_empty());

    let session = Session::builder("990000000001", PASSWORD)
        .extra_region("99", "test")
        .transport(transport)
        .build()
        .unwrap();
    assert_eq!(session.region(), "test");
    assert_eq!(session.lk_region_url(), "https://lk.test.tns-e.ru");
}

#[tokio::test]
async fn test_close_consumes_session() {
    let transport = ScriptedTransport::new();
    let session = transport.session();
    session.close();
    assert!(transport.sent().is_empty());
}
