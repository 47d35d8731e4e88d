//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the profile provider and run the
//! full load → fetch → extract → record → flush cycle against temp files.

use site_harvest::config::{load_config, Config};
use site_harvest::harvest::{run_harvest, HarvestPlan};
use site_harvest::input::load_identifiers;
use site_harvest::output::StopReason;
use site_harvest::storage::{CsvRecordStore, RecordStore};
use site_harvest::{HarvestError, Identifier, InputError, RecordStatus};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "Identifier,RawValue,NormalizedValue,SourceURL,Status\n";

/// Writes the identifier list and a config pointing at the mock server
fn create_test_config(dir: &TempDir, server_uri: &str, identifiers: &str) -> Config {
    let input = dir.path().join("tickers.txt");
    fs::write(&input, identifiers).unwrap();

    let config_path = dir.path().join("harvest.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[source]
url-template = "{uri}/quote/{{id}}"
timeout-secs = 5

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[retry]
max-attempts = 3
initial-backoff-ms = 10
max-backoff-ms = 20

[run]
input-path = '{input}'
flush-every = 1
min-request-interval-ms = 0
request-jitter-ms = 0

[output]
records-path = '{records}'
domains-path = '{domains}'
"#,
            uri = server_uri,
            input = input.display(),
            records = dir.path().join("records.csv").display(),
            domains = dir.path().join("domains.txt").display(),
        ),
    )
    .unwrap();

    load_config(&config_path).expect("test config should be valid")
}

fn profile_page(website: &str, server_uri: &str) -> String {
    format!(
        r#"<html><head><title>Profile</title></head><body>
        <nav><a href="{server}/">Home</a> <a href="https://www.facebook.com/provider">Follow us</a></nav>
        <table>
          <tr><td>Industry</td><td>Consumer Electronics</td></tr>
          <tr><td>Website</td><td><a href="{website}">{website}</a></td></tr>
        </table>
        </body></html>"#,
        server = server_uri,
        website = website
    )
}

async fn mount_page(server: &MockServer, id: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/quote/{}", id)))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

fn pending(config: &Config) -> Vec<Identifier> {
    let identifiers = load_identifiers(Path::new(&config.run.input_path)).unwrap();
    let mut store = CsvRecordStore::new(&config.output.records_path, &config.output.domains_path);
    let checkpoint = store.load().unwrap();
    HarvestPlan::new(identifiers, &checkpoint).pending
}

#[tokio::test]
async fn test_full_harvest_and_idempotent_rerun() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "AAPL", 200, profile_page("https://www.apple.com", &uri)).await;
    mount_page(&server, "MSFT", 404, "Not Found".to_string()).await;

    let config = create_test_config(&dir, &uri, "AAPL\naapl\nMSFT\n");

    let summary = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::Completed);
    assert_eq!(summary.total_input, 3);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.counts.found, 1);
    assert_eq!(summary.counts.not_found, 1);
    assert_eq!(request_count(&server).await, 2);

    let records = fs::read_to_string(&config.output.records_path).unwrap();
    assert_eq!(
        records,
        format!(
            "{}AAPL,https://www.apple.com,apple.com,{uri}/quote/AAPL,found\nMSFT,,N/A,{uri}/quote/MSFT,not_found\n",
            HEADER,
            uri = uri
        )
    );
    let domains = fs::read_to_string(&config.output.domains_path).unwrap();
    assert_eq!(domains, "apple.com\n");

    // Second run: everything is complete, nothing is fetched or rewritten
    let summary = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.counts.total(), 0);
    assert_eq!(request_count(&server).await, 2);
    assert_eq!(fs::read_to_string(&config.output.records_path).unwrap(), records);
    assert_eq!(fs::read_to_string(&config.output.domains_path).unwrap(), domains);
}

#[tokio::test]
async fn test_rate_limited_identifier_is_deferred() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&server, "TSLA", 429, "Too Many Requests".to_string()).await;
    mount_page(&server, "AAPL", 200, profile_page("https://www.apple.com/", &uri)).await;

    let config = create_test_config(&dir, &uri, "TSLA\nAAPL\n");

    let summary = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(summary.deferred, 1);
    assert_eq!(summary.counts.found, 1);
    // 429 is not retried within the run
    assert_eq!(request_count(&server).await, 2);

    let records = CsvRecordStore::read_records(Path::new(&config.output.records_path)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier.as_str(), "AAPL");

    assert_eq!(pending(&config), vec![Identifier::parse("TSLA").unwrap()]);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/quote/IBM"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "IBM", 200, profile_page("https://www.ibm.com/us-en", &uri)).await;

    let config = create_test_config(&dir, &uri, "IBM\n");

    let summary = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(summary.counts.found, 1);
    assert_eq!(request_count(&server).await, 3);

    let records = CsvRecordStore::read_records(Path::new(&config.output.records_path)).unwrap();
    assert_eq!(records[0].normalized_value, "ibm.com");
    assert_eq!(records[0].raw_value.as_deref(), Some("https://www.ibm.com/us-en"));
}

#[tokio::test]
async fn test_error_records_are_retried_next_run() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let dir = tempfile::tempdir().unwrap();

    // Exhausts the attempt budget of the first run
    Mock::given(method("GET"))
        .and(path("/quote/XOM"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "XOM",
        200,
        profile_page("https://corporate.exxonmobil.com/", &uri),
    )
    .await;

    let config = create_test_config(&dir, &uri, "XOM\n");

    let first = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(first.counts.error, 1);
    assert_eq!(pending(&config).len(), 1);

    let second = run_harvest(&config, std::future::pending()).await.unwrap();
    assert_eq!(second.counts.found, 1);

    let records = CsvRecordStore::read_records(Path::new(&config.output.records_path)).unwrap();
    let statuses: Vec<_> = records.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![RecordStatus::Error, RecordStatus::Found]);
    assert_eq!(records[1].normalized_value, "corporate.exxonmobil.com");
    assert!(pending(&config).is_empty());
}

#[tokio::test]
async fn test_missing_input_fails_before_fetch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = create_test_config(&dir, &server.uri(), "AAPL\n");
    config.run.input_path = dir.path().join("missing.csv").display().to_string();

    let result = run_harvest(&config, std::future::pending()).await;
    assert!(matches!(
        result,
        Err(HarvestError::Input(InputError::Missing(_)))
    ));
    assert_eq!(request_count(&server).await, 0);
    assert!(!Path::new(&config.output.records_path).exists());
}

#[tokio::test]
async fn test_interrupted_run_flushes_nothing_lost() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&dir, &server.uri(), "AAPL\nMSFT\n");

    let summary = run_harvest(&config, std::future::ready(())).await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::Interrupted);
    assert_eq!(summary.unprocessed, 2);
    assert_eq!(request_count(&server).await, 0);

    // The final flush still leaves a valid, empty store behind
    assert_eq!(fs::read_to_string(&config.output.records_path).unwrap(), HEADER);
    assert_eq!(pending(&config).len(), 2);
}
