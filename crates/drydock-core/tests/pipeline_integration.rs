//! Integration tests for the pipeline with ScriptedRunner and
//! MemoryBuildLog.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use drydock_core::fakes::{CannedOutput, ScriptedRunner};
use drydock_core::{BuildRequest, CheckOutcome, Pipeline, SyntaxChecker, WorkspaceManager};
use drydock_notify::{NotifyConfig, StatusClient};
use drydock_store::fakes::MemoryBuildLog;
use drydock_store::{today, BuildLog};

fn pipeline_over(
    runner: Arc<ScriptedRunner>,
    store: Arc<MemoryBuildLog>,
    root: &std::path::Path,
) -> Pipeline {
    let workspace = WorkspaceManager::new(runner.clone()).with_root(root);
    let checker = SyntaxChecker::new(runner);
    Pipeline::new(workspace, checker, store)
}

/// Test: full happy path — clone, clean check, record, clean up.
#[tokio::test]
async fn successful_build_records_entry_and_reclaims_workspace() {
    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner.clone(), store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "42")
        .with_commit_sha("abc123");

    let report = pipeline.run(&request).await;

    assert!(report.cloned, "clone should succeed");
    assert_eq!(report.outcome, Some(CheckOutcome::Passed));
    assert!(report.success());
    assert!(report.recorded, "entry should be written");
    assert!(!report.notified, "no notifier configured");
    assert!(report.workspace_removed, "workspace should be reclaimed");
    assert_eq!(report.workspace.as_deref(), Some("widget-42"));
    assert!(!root.path().join("widget-42").exists());

    // Stored entry carries today's date and the gate outcome.
    let entry = store
        .get_by_commit("abc123")
        .await
        .unwrap()
        .expect("entry should exist");
    assert_eq!(entry.build_date, today());
    assert_eq!(entry.test_result, "pass");
    assert_eq!(entry.lint_result, "pass");

    // clone + fetch + reset + pull + pylint, in order.
    let programs: Vec<String> = runner
        .invocations()
        .iter()
        .map(|i| i.program.clone())
        .collect();
    assert_eq!(programs, vec!["git", "git", "git", "git", "pylint"]);
}

/// Test: marker in checker output fails the build and is recorded.
#[tokio::test]
async fn syntax_failure_is_recorded_as_fail() {
    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    for _ in 0..4 {
        runner.push_response(CannedOutput::ok());
    }
    runner.push_response(CannedOutput::ok_with_stdout(
        "x.py:3:7: E0001: invalid syntax (syntax-error)\n",
    ));
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner, store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "7")
        .with_commit_sha("beefcafe");

    let report = pipeline.run(&request).await;

    assert_eq!(report.outcome, Some(CheckOutcome::Failed));
    assert!(!report.success());
    assert!(report.recorded);

    let entry = store.get_by_commit("beefcafe").await.unwrap().unwrap();
    assert_eq!(entry.test_result, "fail");
    assert_eq!(entry.lint_result, "fail");
}

/// Test: checker spawn failure lands in the record as inconclusive,
/// distinct from a genuine syntax failure.
#[tokio::test]
async fn checker_spawn_failure_is_recorded_as_inconclusive() {
    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    for _ in 0..4 {
        runner.push_response(CannedOutput::ok());
    }
    runner.push_response(CannedOutput::spawn_failure("No such file or directory"));
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner, store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "7")
        .with_commit_sha("feedf00d");

    let report = pipeline.run(&request).await;

    assert_eq!(report.outcome, Some(CheckOutcome::Inconclusive));
    let entry = store.get_by_commit("feedf00d").await.unwrap().unwrap();
    assert_eq!(entry.lint_result, "inconclusive");
}

/// Test: a foreign-host URL aborts before any process runs and writes
/// nothing.
#[tokio::test]
async fn foreign_host_url_spawns_nothing_and_records_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner.clone(), store.clone(), root.path());

    let request = BuildRequest::new("https://gitlab.com/octo/widget.git", "main", "1")
        .with_commit_sha("abc123");

    let report = pipeline.run(&request).await;

    assert!(!report.cloned);
    assert!(report.outcome.is_none(), "gate must not run");
    assert!(!report.recorded);
    assert_eq!(runner.invocation_count(), 0, "no process may be spawned");
    assert!(store.list_all().await.unwrap().is_empty());
}

/// Test: clone failure aborts the build before the gate runs, but the
/// failed build still lands in the durable record.
#[tokio::test]
async fn clone_failure_aborts_before_check_and_is_recorded() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_response(CannedOutput::exits_with(128));
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner.clone(), store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "1")
        .with_commit_sha("abc123");

    let report = pipeline.run(&request).await;

    assert!(!report.cloned);
    assert!(report.outcome.is_none());
    assert_eq!(runner.invocation_count(), 1, "only the clone may run");

    assert!(report.recorded, "failed clone must leave a build entry");
    let entry = store.get_by_commit("abc123").await.unwrap().unwrap();
    assert_eq!(entry.test_result, "fail");
    assert_eq!(entry.lint_result, "fail");
}

/// Test: a clone failure without a pinned commit has nothing to record
/// against.
#[tokio::test]
async fn clone_failure_without_commit_records_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_response(CannedOutput::exits_with(128));
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner, store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "1");

    let report = pipeline.run(&request).await;

    assert!(!report.recorded);
    assert!(store.list_all().await.unwrap().is_empty());
}

/// Test: without a pinned commit the pipeline captures the workspace
/// HEAD and records against it.
#[tokio::test]
async fn head_sha_is_captured_when_request_has_no_commit() {
    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    for _ in 0..4 {
        runner.push_response(CannedOutput::ok());
    }
    runner.push_response(CannedOutput::ok_with_stdout("f00dfeed\n"));
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner.clone(), store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "3");

    let report = pipeline.run(&request).await;

    assert_eq!(report.commit_sha.as_deref(), Some("f00dfeed"));
    assert!(report.recorded);
    assert!(store.get_by_commit("f00dfeed").await.unwrap().is_some());

    // rev-parse runs between the refresh commands and the checker.
    let programs: Vec<String> = runner
        .invocations()
        .iter()
        .map(|i| i.program.clone())
        .collect();
    assert_eq!(programs, vec!["git", "git", "git", "git", "git", "pylint"]);
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Read one HTTP/1.1 request, headers plus content-length body.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).into_owned();
            let body_len = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + body_len {
                return String::from_utf8_lossy(&buf).into_owned();
            }
        }
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn respond(stream: &mut TcpStream, status_line: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
}

/// Test: with a notifier attached, a passing build creates a commit
/// status on the host and the report reflects it.
#[tokio::test]
async fn passing_build_notifies_the_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Canned host: repository resolution, then status creation.
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        respond(&mut stream, "200 OK", "{}").await;

        let (mut stream, _) = listener.accept().await.unwrap();
        let create = read_request(&mut stream).await;
        respond(&mut stream, "201 Created", r#"{"state":"success"}"#).await;
        create
    });

    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let workspace = WorkspaceManager::new(runner.clone()).with_root(root.path());
    let checker = SyntaxChecker::new(runner);
    let notifier = StatusClient::new(
        NotifyConfig::new("token", "octo", "widget").with_base_url(&format!("http://{addr}")),
    );
    let pipeline = Pipeline::new(workspace, checker, store.clone()).with_notifier(notifier);

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "9")
        .with_commit_sha("abc123");

    let report = pipeline.run(&request).await;

    assert!(report.success());
    assert!(report.notified, "host accepted the status");
    assert!(report.recorded);

    let create = server.await.unwrap();
    assert!(
        create.starts_with("POST /repos/octo/widget/statuses/abc123 "),
        "unexpected status request: {create}"
    );
    assert!(create.contains("Syntax check passed with no errors."));
}

/// Test: a duplicate commit leaves the first record intact and the
/// pipeline finishes cleanly.
#[tokio::test]
async fn rebuilding_a_commit_does_not_overwrite_the_record() {
    let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
    let store = Arc::new(MemoryBuildLog::new());
    let root = tempfile::tempdir().unwrap();
    let pipeline = pipeline_over(runner, store.clone(), root.path());

    let request = BuildRequest::new("https://github.com/octo/widget.git", "main", "1")
        .with_commit_sha("abc123");

    let first = pipeline.run(&request).await;
    assert!(first.recorded);

    let second = pipeline.run(&request).await;
    assert!(!second.recorded, "duplicate must not be recorded");
    assert!(second.workspace_removed, "cleanup still runs");

    assert_eq!(store.list_all().await.unwrap().len(), 1);
}
