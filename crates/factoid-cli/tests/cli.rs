//! 🧪 End-to-end: the real binary, a fake API, a throwaway directory.

use std::path::Path;
use std::process::Output;

use tokio::process::Command;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, url: &str, width: usize) -> std::path::PathBuf {
    let config_path = dir.join("factoid.toml");
    let contents = format!(
        r#"
        [runtime]
        width = {width}

        [source_config.Http]
        url = "{url}"
        timeout_secs = 5

        [sink_config.File]
        file_name = "{output}"

        [error_log]
        file_name = "{log}"
        "#,
        output = dir.join("data.json").display(),
        log = dir.join("errors.log").display(),
    );
    std::fs::write(&config_path, contents).expect("💀 couldn't write the test config");
    config_path
}

async fn run_factoid(dir: &Path, config_path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_factoid"))
        .arg(config_path)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("💀 the factoid binary didn't even start")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn the_one_where_a_500_exits_nonzero_and_writes_one_log_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("💀 tempdir");
    let config_path = write_config(dir.path(), &server.uri(), 2);

    let output = run_factoid(dir.path(), &config_path).await;

    assert_eq!(output.status.code(), Some(1));
    let log = std::fs::read_to_string(dir.path().join("errors.log"))
        .expect("💀 the fatal path should have written errors.log");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1, "💀 expected exactly one line, got: {log}");
    assert!(lines[0].contains("500"), "💀 the line should mention the status: {}", lines[0]);
    assert!(
        !dir.path().join("data.json").exists(),
        "💀 a failed run must not write the output file"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn the_one_where_everything_works_and_the_file_appears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "e2e",
            "text": "A jiffy is an actual unit of time.",
            "source": "djtech.net",
            "source_url": "http://www.djtech.net/humor/useless_facts.htm"
        })))
        .expect(4)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("💀 tempdir");
    let config_path = write_config(dir.path(), &server.uri(), 4);

    let output = run_factoid(dir.path(), &config_path).await;

    assert!(
        output.status.success(),
        "💀 expected exit 0, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let persisted: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("data.json")).expect("💀 data.json should exist"),
    )
    .expect("💀 data.json should be JSON");
    assert_eq!(persisted["facts"].as_array().map(Vec::len), Some(4));
    assert!(!dir.path().join("errors.log").exists());
}
