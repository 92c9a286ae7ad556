//! Client tests against a loopback HTTP responder

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::app::client::{ClientConfig, DataSource, SdmxClient};
use crate::app::models::{CodeEntry, CodelistRole};
use crate::app::query::SeriesQuery;
use crate::app::selection::Selection;
use crate::errors::RemoteError;

/// Serve a single response and return the request line that was received
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = vec![0u8; 8192];
        let read = socket.read(&mut buffer).await.unwrap();
        let request = String::from_utf8_lossy(&buffer[..read]).into_owned();

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        request.lines().next().unwrap_or_default().to_string()
    });

    (format!("http://{}/REST/SDMX_XML.svc", addr), handle)
}

fn client_for(base_url: String) -> SdmxClient {
    SdmxClient::with_config(ClientConfig {
        base_url,
        series_timeout: Duration::from_millis(300),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_list_dataflows_sorted() {
    let body = r#"<Structure><Dataflows>
        <Dataflow><Name>Government Finance</Name><KeyFamilyRef><KeyFamilyID>GFS</KeyFamilyID></KeyFamilyRef></Dataflow>
        <Dataflow><Name>Balance of Payments</Name><KeyFamilyRef><KeyFamilyID>BOP</KeyFamilyID></KeyFamilyRef></Dataflow>
    </Dataflows></Structure>"#;
    let (base_url, server) = serve_once("200 OK", body).await;

    let client = client_for(base_url);
    let dataflows = client.list_dataflows().await.unwrap();

    let request_line = server.await.unwrap();
    assert_eq!(request_line, "GET /REST/SDMX_XML.svc/Dataflow HTTP/1.1");
    let ids: Vec<_> = dataflows.iter().map(|d| d.key_family_id.as_str()).collect();
    assert_eq!(ids, vec!["BOP", "GFS"]);
}

#[tokio::test]
async fn test_fetch_schema_request_path_and_missing_list() {
    let body = r#"<Structure><CodeLists>
        <CodeList id="CL_FREQ"><Code value="A"><Description>Annual</Description></Code></CodeList>
        <CodeList id="CL_AREA_BOP"><Code value="US"><Description>United States</Description></Code></CodeList>
    </CodeLists></Structure>"#;
    let (base_url, server) = serve_once("200 OK", body).await;

    let client = client_for(base_url);
    let lists = client.fetch_schema("BOP").await.unwrap();

    let request_line = server.await.unwrap();
    assert_eq!(
        request_line,
        "GET /REST/SDMX_XML.svc/DataStructure/BOP HTTP/1.1"
    );
    assert_eq!(lists.codes(CodelistRole::Frequency).len(), 1);
    assert_eq!(lists.codes(CodelistRole::Area).len(), 1);
    assert!(lists.codes(CodelistRole::Indicator).is_empty());
}

#[tokio::test]
async fn test_fetch_series_request_path() {
    let body = r#"<CompactData><DataSet>
        <Series FREQ="Q" REF_AREA="US" INDICATOR="NGDP"><Obs TIME_PERIOD="2020-Q1" OBS_VALUE="1"/></Series>
        <Series FREQ="A" REF_AREA="US" INDICATOR="NGDP"><Obs TIME_PERIOD="2020" OBS_VALUE="4"/></Series>
    </DataSet></CompactData>"#;
    let (base_url, server) = serve_once("200 OK", body).await;

    let mut selection = Selection::new();
    selection.toggle(CodelistRole::Frequency, CodeEntry::from_value("Q"));
    selection.toggle(CodelistRole::Frequency, CodeEntry::from_value("A"));
    selection.toggle(CodelistRole::Area, CodeEntry::from_value("US"));
    selection.toggle(CodelistRole::Indicator, CodeEntry::from_value("NGDP"));

    let client = client_for(base_url);
    let tables = client.fetch_series("IFS", &selection).await.unwrap();

    let request_line = server.await.unwrap();
    assert_eq!(
        request_line,
        "GET /REST/SDMX_XML.svc/CompactData/IFS/Q+A.US.NGDP HTTP/1.1"
    );
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].label(), "A_US_NGDP");
}

#[tokio::test]
async fn test_server_error_is_remote_unavailable() {
    let (base_url, server) = serve_once("500 Internal Server Error", "oops").await;

    let client = client_for(base_url);
    let error = client.list_dataflows().await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(error, RemoteError::ServerError { status: 500, .. }));
    assert_eq!(error.kind(), crate::errors::ErrorKind::RemoteUnavailable);
}

#[tokio::test]
async fn test_malformed_payload() {
    let (base_url, server) = serve_once("200 OK", "<Structure><Dataflow></Structure>").await;

    let client = client_for(base_url);
    let error = client.list_dataflows().await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(error, RemoteError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_series_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        drop(socket);
    });

    let client = client_for(format!("http://{}/REST/SDMX_XML.svc", addr));
    let query = SeriesQuery::from_values("IFS", vec![], vec![], vec!["NGDP".to_string()]);
    let error = DataSource::fetch_series(&client, &query).await.unwrap_err();

    assert!(error.is_timeout());
    assert!(matches!(error, RemoteError::Timeout { .. }));
    server.abort();
}

#[tokio::test]
async fn test_invalid_requests_rejected_before_io() {
    let client = client_for("http://127.0.0.1:9/unused".to_string());

    let error = client.fetch_schema("  ").await.unwrap_err();
    assert!(matches!(error, RemoteError::InvalidRequest { .. }));

    let query = SeriesQuery::from_values("IFS", vec![], vec![], vec![]);
    let error = client.fetch_series_query(&query).await.unwrap_err();
    assert!(matches!(error, RemoteError::InvalidRequest { .. }));
}

#[test]
fn test_invalid_base_url() {
    let result = SdmxClient::with_config(ClientConfig {
        base_url: "not a url".to_string(),
        ..Default::default()
    });
    assert!(matches!(result, Err(RemoteError::InvalidUrl { .. })));

    let result = SdmxClient::with_config(ClientConfig {
        base_url: "mailto:someone@example.org".to_string(),
        ..Default::default()
    });
    assert!(matches!(result, Err(RemoteError::InvalidUrl { .. })));
}
