use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

/// Two lint runs of the same file checked out under different directories
const FIRST_RUN: &str = r#"[{"filePath":"/repo/first/index.js","messages":[
  {"ruleId":"no-undef","severity":2,"message":"'x' is not defined.","line":2,"column":10},
  {"ruleId":"semi","severity":1,"message":"Missing semicolon.","line":2,"column":11,"fix":{"range":[30,30],"text":";"}}
],"errorCount":1,"warningCount":1,"fixableErrorCount":0,"fixableWarningCount":1,
"source":"function foo () {\n  return x\n}\n"}]"#;

const SECOND_RUN: &str = r#"[{"filePath":"/repo/index.js","messages":[
  {"ruleId":"no-undef","severity":2,"message":"'x' is not defined.","line":2,"column":10}
],"errorCount":1,"warningCount":0,"fixableErrorCount":0,"fixableWarningCount":0,
"source":"function foo () {\n  return x\n}\n"}]"#;

fn both_runs() -> String {
    format!("{FIRST_RUN}\n{SECOND_RUN}")
}

fn lintmux(args: &[&str], stdin: &str) -> Output {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lintmux"));
    cmd.args(args)
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, _) in std::env::vars().filter(|(k, _)| k.starts_with("LINTMUX_")) {
        cmd.env_remove(key);
    }

    let mut child = cmd.spawn().unwrap();
    {
        let mut pipe = child.stdin.take().unwrap();
        pipe.write_all(stdin.as_bytes()).unwrap();
    }
    child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn basic_operation_keeps_paths_apart() {
    let out = lintmux(&["--nopipe", "--no-config"], &both_runs());
    let text = stdout(&out);
    assert_eq!(stderr(&out), "");
    assert!(text.contains("/repo/first/index.js (1x)"));
    assert!(text.contains("/repo/index.js (1x)"));
    assert!(!text.contains("2x"));
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn match_basename() {
    let out = lintmux(&["--nopipe", "--no-config", "-b"], &both_runs());
    let text = stdout(&out);
    assert_eq!(stderr(&out), "");
    assert!(text.contains("index.js (2x)"));
    assert!(!text.contains("first/index.js"));
}

#[cfg(unix)]
#[test]
fn match_default_regex() {
    let out = lintmux(&["--nopipe", "--no-config", "--matcher="], &both_runs());
    let text = stdout(&out);
    assert_eq!(stderr(&out), "");
    assert!(text.contains("index.js (2x)"));
    assert!(!text.contains("first/index.js"));
}

#[test]
fn match_custom_regex() {
    let out = lintmux(&["--nopipe", "--no-config", "-m", "([^./]+).js$"], &both_runs());
    let text = stdout(&out);
    assert_eq!(stderr(&out), "");
    assert!(text.contains("index (2x)"));
    assert!(!text.contains("index.js"));
}

#[test]
fn below_threshold_is_still_listed() {
    let out = lintmux(&["--nopipe", "--no-config", "-b", "-t", "0.6"], &both_runs());
    let text = stdout(&out);
    assert!(text.contains("2x"));
    assert!(text.contains("1x"));
    assert!(text.contains("2 problems (1 error, 1 warning)"));
    assert!(!text.contains("1 problem (1 error, 0 warnings)"));
}

#[test]
fn below_threshold_hidden() {
    let out = lintmux(&["--nopipe", "--no-config", "-b", "-t", "0.6", "--hide"], &both_runs());
    let text = stdout(&out);
    assert!(text.contains("2x"));
    assert!(!text.contains("1x"));
    assert!(text.contains("1 problem (1 error, 0 warnings)"));
}

#[test]
fn show_source() {
    let out = lintmux(&["--nopipe", "--no-config", "-b", "-s"], &both_runs());
    let text = stdout(&out);
    assert!(text.contains("/repo/first/index.js"));
    assert!(text.contains("2:   return x"));
}

#[test]
fn inline_input_and_stdin_are_combined() {
    let out = lintmux(&["--nopipe", "--no-config", "-b", "-i", FIRST_RUN], SECOND_RUN);
    assert_eq!(stderr(&out), "");
    assert!(stdout(&out).contains("index.js (2x)"));
}

#[test]
fn piped_stdout_passes_raw_results_through() {
    let out = lintmux(&["--no-config", "-b"], &both_runs());
    let raw: Value = serde_json::from_str(&stdout(&out)).unwrap();
    let files = raw.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["filePath"], "/repo/first/index.js");
    assert_eq!(files[1]["filePath"], "/repo/index.js");
    // Totals from the raw rollups decide the exit code.
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn chained_multiplexers_merge_downstream() {
    let upstream = lintmux(&["--no-config", "-i", FIRST_RUN], SECOND_RUN);
    let downstream = lintmux(&["--nopipe", "--no-config", "-b"], &stdout(&upstream));
    assert!(stdout(&downstream).contains("index.js (2x)"));
}

#[test]
fn merged_report_format() {
    let out = lintmux(&["--no-config", "-b", "-f", "merged"], &both_runs());
    let report: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["inputs"], 2);
    assert_eq!(report["totals"]["errors"], 1);
    assert_eq!(report["totals"]["warnings"], 1);
    let file = &report["files"][0];
    assert_eq!(file["filePath"], "index.js");
    assert_eq!(file["occurrence"], 2);
    assert_eq!(file["messages"][0]["occurrence"], 2);
    assert_eq!(file["messages"][1]["occurrence"], 1);
}

#[test]
fn clean_results_exit_zero() {
    let out = lintmux(
        &["--nopipe", "--no-config"],
        r#"[{"filePath":"a.js","messages":[],"errorCount":0,"warningCount":0}]"#,
    );
    assert_eq!(stdout(&out), "");
    assert!(out.status.success());
}

#[test]
fn non_matching_matcher_fails_without_output() {
    let out = lintmux(&["--nopipe", "--no-config", "-m", r"\.ts$"], &both_runs());
    assert_eq!(stdout(&out), "");
    assert!(stderr(&out).contains("did not match"));
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn malformed_input_fails() {
    let out = lintmux(&["--nopipe", "--no-config"], "Oops! Something went wrong");
    assert_eq!(stdout(&out), "");
    assert!(stderr(&out).contains("malformed lint results from stdin"));
    assert!(!out.status.success());
}

#[test]
fn unparseable_threshold_flag_exits_one() {
    let out = lintmux(&["--nopipe", "--no-config", "-t", "abc"], "");
    assert_eq!(stdout(&out), "");
    assert!(stderr(&out).contains("abc"));
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unknown_flag_exits_one() {
    let out = lintmux(&["--no-config", "--no-such-flag"], "");
    assert_eq!(stdout(&out), "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_exits_zero() {
    let out = lintmux(&["--help"], "");
    assert!(stdout(&out).contains("--threshold"));
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn unknown_format_fails() {
    let out = lintmux(&["--no-config", "-f", "table"], "");
    assert!(stderr(&out).contains("unknown output format"));
    assert!(!out.status.success());
}

#[cfg(unix)]
#[test]
fn inline_command_output_is_merged() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("run.json");
    std::fs::write(&fixture, FIRST_RUN).unwrap();
    let script = format!("cat '{}'", fixture.display());

    let out = lintmux(&["--nopipe", "--no-config", "-b", "sh", "-c", &script], SECOND_RUN);
    assert_eq!(stderr(&out), "");
    assert!(stdout(&out).contains("index.js (2x)"));
}
