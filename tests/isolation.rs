//! End-to-end runs of the demo test program

use serde_json::Value;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

const DEMO: &str = env!("CARGO_BIN_EXE_isotest-demo");

fn demo(args: &[&str]) -> Output {
    Command::new(DEMO)
        .args(args)
        .env_remove("ISOTEST_THREADS")
        .env_remove("ISOTEST_TIMEOUT")
        .env_remove("ISOTEST_REPORTERS")
        .env_remove("ISOTEST_CONFIG")
        .env_remove("ISOTEST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run isotest-demo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn events(output: &Output, kind: &str) -> Vec<Value> {
    stdout(output)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|event| event["event"] == kind)
        .collect()
}

/// `test_finished` events keyed by path
fn results(output: &Output) -> Vec<(String, String, String)> {
    let mut results: Vec<_> = events(output, "test_finished")
        .into_iter()
        .map(|e| {
            (
                e["path"].as_str().unwrap().to_string(),
                e["status"].as_str().unwrap().to_string(),
                e["description"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    results.sort();
    results
}

fn summary(output: &Output) -> Value {
    let mut summaries = events(output, "summary");
    assert_eq!(summaries.len(), 1, "stdout: {}", stdout(output));
    summaries.remove(0)
}

#[test]
fn test_math_suite() {
    let output = demo(&["-t", "math/", "-r", "json"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        results(&output),
        vec![
            ("math/add_ok".into(), "passed".into(), "".into()),
            (
                "math/div_by_zero".into(),
                "failed".into(),
                "division by zero".into()
            ),
        ]
    );

    let summary = summary(&output);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["passed"], 1);
    assert_eq!(
        summary["failures"],
        serde_json::json!([{ "status": "failed", "path": "math/div_by_zero" }])
    );
}

#[test]
fn test_crashes_are_contained() {
    let output = demo(&["-t", "crashes/", "-r", "json", "-j", "2"]);
    assert_eq!(output.status.code(), Some(1));

    let results = results(&output);
    let status_of = |path: &str| {
        results
            .iter()
            .find(|(p, _, _)| p == path)
            .map(|(_, status, description)| (status.clone(), description.clone()))
            .unwrap_or_else(|| panic!("no result for {path}"))
    };

    assert_eq!(status_of("crashes/abort").0, "crashed");
    assert_eq!(status_of("crashes/exit").0, "crashed");
    assert_eq!(
        status_of("crashes/panics"),
        ("failed".into(), "expected at least one value".into())
    );
    assert_eq!(
        status_of("crashes/opaque_panic"),
        (
            "failed".into(),
            "test panicked with a non-string payload".into()
        )
    );
    assert_eq!(
        status_of("crashes/multiline"),
        ("failed".into(), "first line\nsecond line".into())
    );

    let summary = summary(&output);
    assert_eq!(summary["total"], 5);
    assert_eq!(summary["passed"], 0);
}

#[test]
fn test_hanging_case_times_out() {
    let start = Instant::now();
    let output = demo(&["-t", "slow/", "-l", "1", "-r", "json"]);
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(output.status.code(), Some(1));

    let finished = events(&output, "test_finished");
    let hang = finished
        .iter()
        .find(|e| e["path"] == "slow/hang")
        .expect("no result for slow/hang");
    assert_eq!(hang["status"], "timed_out");
    assert!(hang["duration_ms"].as_u64().unwrap() >= 1000);

    let brief = finished
        .iter()
        .find(|e| e["path"] == "slow/brief")
        .expect("no result for slow/brief");
    assert_eq!(brief["status"], "passed");
}

#[test]
fn test_exact_filter_runs_one_case() {
    let output = demo(&["-t", "math/add_ok", "-r", "json"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        results(&output),
        vec![("math/add_ok".into(), "passed".into(), "".into())]
    );
}

#[test]
fn test_subtree_filter() {
    let output = demo(&["-t", "outer/inner", "-r", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let paths: Vec<_> = results(&output).into_iter().map(|r| r.0).collect();
    assert_eq!(paths, vec!["outer/inner/a", "outer/inner/b"]);
}

#[test]
fn test_child_protocol_line() {
    let output = demo(&["--test", "math/div_by_zero", "--reporter", "subprocess"]);
    assert_eq!(stdout(&output), "1 division by zero\n");

    let output = demo(&["--test", "crashes/multiline", "--reporter", "subprocess"]);
    assert_eq!(stdout(&output), "1 first line\\nsecond line\n");

    let output = demo(&["--test", "outer/inner/a", "--reporter", "subprocess"]);
    assert_eq!(stdout(&output), "0 \n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_printing_case_passes() {
    let output = demo(&["-t", "output/", "-r", "json"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        results(&output),
        vec![("output/chatty".into(), "passed".into(), "".into())]
    );
}

#[test]
fn test_child_output_goes_to_stderr() {
    let output = demo(&["--test", "output/chatty", "--reporter", "subprocess"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "0 \n");

    let err = stderr(&output);
    assert!(err.contains("progress: step 1"), "{err}");
    assert!(err.contains("progress: step 2"), "{err}");
    assert!(err.contains("progress on stderr"), "{err}");
}

#[test]
fn test_quiet_malformed_filter_reports_not_found() {
    let output = demo(&["-q", "-t", "math"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "4");
}

#[test]
fn test_malformed_filter_is_a_config_error() {
    let output = demo(&["-t", "math"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("invalid test name format"));
}

#[test]
fn test_unknown_reporter() {
    let output = demo(&["-t", "math/", "-r", "teamcity"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown reporter `teamcity`"));
}

#[test]
fn test_unknown_reporter_wins_over_malformed_filter() {
    let output = demo(&["-q", "-r", "bogus", "-t", "math"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("unknown reporter `bogus`"));
}

#[test]
fn test_quiet_run_prints_nothing() {
    let output = demo(&["-q", "-t", "outer/"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_parallel_runs_are_exact() {
    for _ in 0..3 {
        let output = demo(&["-t", "many/", "-j", "8", "-r", "json"]);
        assert_eq!(output.status.code(), Some(0));

        let summary = summary(&output);
        assert_eq!(summary["total"], 20);
        assert_eq!(summary["passed"], 20);
        assert_eq!(summary["failures"], serde_json::json!([]));
        assert_eq!(results(&output).len(), 20);
    }
}

#[test]
fn test_console_reporter_summary() {
    let output = demo(&["-t", "math/"]);
    assert_eq!(output.status.code(), Some(1));

    let out = stdout(&output);
    assert!(out.contains("Total: 2 | Passed: 1 | Failed: 1"), "{out}");
    assert!(out.contains("math/div_by_zero"), "{out}");
}

#[test]
fn test_list_paths() {
    let output = demo(&["--list"]);
    assert_eq!(output.status.code(), Some(0));

    let out = stdout(&output);
    let paths: Vec<_> = out.lines().collect();
    assert!(paths.contains(&"slow/hang"));
    assert!(paths.contains(&"outer/inner/a"));
    assert_eq!(paths.len(), 2 + 5 + 2 + 1 + 3 + 20);
}
