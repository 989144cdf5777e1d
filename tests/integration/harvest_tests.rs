//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up mock OAI-PMH repositories and run
//! complete harvests over real HTTP.

use oai_harvest::config::{Config, HttpConfig, RetryConfig};
use oai_harvest::harvester::{load_response, WorkerPool};
use oai_harvest::{HarvestError, Harvester, PageOutcome, Request, Verb};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a harvester with millisecond backoff so retry tests stay fast
fn create_test_harvester(max_attempts: u32) -> Harvester {
    let config = Config {
        http: HttpConfig {
            timeout_secs: 1,
            connect_timeout_secs: 1,
            user_agent: "oai-harvest-tests/1.0".to_string(),
        },
        retry: RetryConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        },
        ..Config::default()
    };
    Harvester::from_config(&config).expect("Failed to build harvester")
}

fn record(id: &str) -> String {
    format!(
        "<record><header><identifier>{}</identifier><datestamp>2012-10-01</datestamp>\
         <setSpec>DTS</setSpec></header><metadata><dc><title>{}</title></dc></metadata></record>",
        id, id
    )
}

fn header(id: &str) -> String {
    format!(
        "<header><identifier>{}</identifier><datestamp>2012-10-01</datestamp></header>",
        id
    )
}

fn page(verb: &str, items: &[String], token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2012-10-02T10:00:00Z</responseDate>
  <request verb="{verb}">http://example.org/oai</request>
  <{verb}>{items}{token}</{verb}>
</OAI-PMH>"#,
        verb = verb,
        items = items.concat(),
        token = token
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/xml")
}

/// Query parameters of every request the mock server received, in order
async fn received_queries(server: &MockServer) -> Vec<HashMap<String, String>> {
    server
        .received_requests()
        .await
        .expect("Request recording is disabled")
        .iter()
        .map(|request| request.url.query_pairs().into_owned().collect())
        .collect()
}

#[tokio::test]
async fn test_two_page_list_records() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/oai"))
        .and(query_param("verb", "ListRecords"))
        .and(query_param("set", "DTS"))
        .and(query_param("metadataPrefix", "dcx"))
        .respond_with(xml(page(
            "ListRecords",
            &[record("oai:x:1"), record("oai:x:2")],
            r#"<resumptionToken completeListSize="3" cursor="0">abc</resumptionToken>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/oai"))
        .and(query_param("verb", "ListRecords"))
        .and(query_param("resumptionToken", "abc"))
        .respond_with(xml(page(
            "ListRecords",
            &[record("oai:x:3")],
            r#"<resumptionToken completeListSize="3" cursor="2"/>"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(3);
    let request = Request::new(base_url.as_str())
        .with_set("DTS")
        .with_metadata_prefix("dcx")
        .with_from("2012-09-06");

    let mut identifiers = Vec::new();
    let report = harvester
        .harvest_records(&request, |record| {
            assert!(record.metadata.is_some());
            identifiers.push(record.header.identifier.clone());
        })
        .await
        .expect("Harvest failed");

    assert_eq!(identifiers, vec!["oai:x:1", "oai:x:2", "oai:x:3"]);
    assert_eq!(report.pages, 2);
    assert_eq!(report.items, 3);
    assert_eq!(report.complete_list_size, Some(3));

    // The caller's request is left as it was
    assert_eq!(request.verb, None);
    assert_eq!(request.resumption_token, None);

    let queries = received_queries(&mock_server).await;
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("from").map(String::as_str), Some("2012-09-06"));
    assert_eq!(queries[0].get("resumptionToken"), None);

    // Resumption requests carry only the verb and the token
    let second = &queries[1];
    assert_eq!(second.len(), 2);
    assert_eq!(second.get("verb").map(String::as_str), Some("ListRecords"));
    assert_eq!(second.get("resumptionToken").map(String::as_str), Some("abc"));
}

#[tokio::test]
async fn test_resumption_token_is_escaped() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());
    let token = "2012-10-01|set=DTS&page 2/3";

    Mock::given(method("GET"))
        .and(query_param("metadataPrefix", "oai_dc"))
        .respond_with(xml(page(
            "ListIdentifiers",
            &[header("a")],
            &format!(
                "<resumptionToken completeListSize=\"2\">{}</resumptionToken>",
                token.replace('&', "&amp;")
            ),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("resumptionToken", token))
        .respond_with(xml(page("ListIdentifiers", &[header("b")], "")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(3);
    let request = Request::new(base_url).with_metadata_prefix("oai_dc");

    let mut identifiers = Vec::new();
    harvester
        .harvest_identifiers(&request, |header| identifiers.push(header.identifier.clone()))
        .await
        .expect("Harvest failed");

    assert_eq!(identifiers, vec!["a", "b"]);
}

#[tokio::test]
async fn test_retries_server_errors() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(xml(page("ListIdentifiers", &[header("a")], "")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(10);
    let request = Request::new(base_url).with_metadata_prefix("oai_dc");

    let report = harvester
        .harvest_identifiers(&request, |_| {})
        .await
        .expect("Harvest failed");

    assert_eq!(report.pages, 1);
    assert_eq!(report.items, 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(10);
    let request = Request::new(base_url)
        .with_verb(Verb::ListRecords)
        .with_metadata_prefix("oai_dc");

    let mut failures = 0;
    let mut fetched = 0;
    let result = harvester
        .harvest(&request, |outcome| match outcome {
            PageOutcome::Fetched(_) => fetched += 1,
            PageOutcome::Failed(_) => failures += 1,
        })
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::Client { status: 404, .. })
    ));
    assert_eq!(fetched, 0);
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(3);
    let request = Request::new(base_url).with_verb(Verb::Identify);

    let result = harvester.perform(&request).await;

    match result {
        Err(HarvestError::RetriesExhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, HarvestError::Server { status: 500, .. }));
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(
            xml(page("Identify", &[], "")).set_delay(Duration::from_millis(2500)),
        )
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(2);
    let request = Request::new(base_url).with_verb(Verb::Identify);

    match harvester.perform(&request).await {
        Err(HarvestError::RetriesExhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*source, HarvestError::Timeout { .. }));
        }
        other => panic!("Expected timeout exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_records_match_ends_harvest() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(xml(r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2012-10-02T10:00:00Z</responseDate>
  <request verb="ListRecords">http://example.org/oai</request>
  <error code="noRecordsMatch">No records match</error>
</OAI-PMH>"#
            .to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(3);
    let request = Request::new(base_url).with_metadata_prefix("oai_dc");

    let mut count = 0;
    let report = harvester
        .harvest_records(&request, |_| count += 1)
        .await
        .expect("OAI errors are not failures");

    assert_eq!(count, 0);
    assert_eq!(report.pages, 1);
    assert_eq!(report.items, 0);
}

#[tokio::test]
async fn test_fan_out_to_worker_pool() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());

    let first: Vec<String> = (1..=5).map(|i| header(&format!("p1-{}", i))).collect();
    let second: Vec<String> = (1..=2).map(|i| header(&format!("p2-{}", i))).collect();

    Mock::given(method("GET"))
        .and(query_param("metadataPrefix", "oai_dc"))
        .respond_with(xml(page(
            "ListIdentifiers",
            &first,
            r#"<resumptionToken completeListSize="7">next</resumptionToken>"#,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("resumptionToken", "next"))
        .respond_with(xml(page("ListIdentifiers", &second, "")))
        .mount(&mock_server)
        .await;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let pool = WorkerPool::spawn(3, 1, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let harvester = create_test_harvester(3);
    let request = Request::new(base_url).with_metadata_prefix("oai_dc");

    let report = harvester
        .fan_out_identifiers(&request, pool.senders())
        .await
        .expect("Fan-out failed");
    let handled = pool.join().await.expect("Worker failed");

    // Rotation restarts at channel 0 on every page
    assert_eq!(handled, vec![3, 3, 1]);
    assert_eq!(seen.load(Ordering::SeqCst), 7);
    assert_eq!(report.pages, 2);
    assert_eq!(report.complete_list_size, Some(7));
}

#[tokio::test]
async fn test_identify_and_saved_response() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/oai", mock_server.uri());
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2012-10-02T10:00:00Z</responseDate>
  <request verb="Identify">http://example.org/oai</request>
  <Identify>
    <repositoryName>Example Repository</repositoryName>
    <baseURL>http://example.org/oai</baseURL>
    <protocolVersion>2.0</protocolVersion>
    <adminEmail>admin@example.org</adminEmail>
    <earliestDatestamp>2001-01-01T00:00:00Z</earliestDatestamp>
    <deletedRecord>transient</deletedRecord>
    <granularity>YYYY-MM-DDThh:mm:ssZ</granularity>
  </Identify>
</OAI-PMH>"#;

    Mock::given(method("GET"))
        .and(query_param("verb", "Identify"))
        .respond_with(xml(body.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = create_test_harvester(3);
    let response = harvester
        .perform(&Request::new(base_url).with_verb(Verb::Identify))
        .await
        .expect("Identify failed");

    let identify = response.identify.as_ref().expect("Missing Identify");
    assert_eq!(identify.repository_name, "Example Repository");
    assert_eq!(identify.admin_emails, vec!["admin@example.org"]);

    // The same document loaded from disk parses identically
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();

    let loaded = load_response(file.path()).expect("Failed to load response");
    assert_eq!(loaded, response);
}
