#![cfg(all(unix, feature = "cli"))]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_runtime_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/plcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("runtime dir should be creatable");
    dir
}

fn pulselog(runtime_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pulselog"));
    cmd.env_remove("PULSELOG_RUNTIME_DIR")
        .arg("--log-level")
        .arg("error")
        .arg("--runtime-dir")
        .arg(runtime_dir);
    cmd
}

fn run(runtime_dir: &Path, args: &[&str]) -> Output {
    pulselog(runtime_dir)
        .args(args)
        .output()
        .expect("pulselog should run")
}

fn spawn_server(runtime_dir: &Path, name: &str) -> Child {
    let child = pulselog(runtime_dir)
        .arg("serve")
        .arg(name)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve command should start");
    wait_for_live(runtime_dir, name, Duration::from_secs(5));
    child
}

fn wait_for_live(runtime_dir: &Path, name: &str, timeout: Duration) {
    let start = Instant::now();
    loop {
        let out = run(runtime_dir, &["--format", "json", "info", name]);
        let report: serde_json::Value =
            serde_json::from_slice(&out.stdout).expect("info output should be JSON");
        if report["live"] == true {
            return;
        }
        if start.elapsed() >= timeout {
            panic!("server on {name} did not come up");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> std::process::ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("try_wait should work") {
            return status;
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            panic!("child did not exit in time");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn stdout_lines(child: &mut Child) -> Vec<String> {
    let mut out = String::new();
    child
        .stdout
        .take()
        .expect("stdout is piped")
        .read_to_string(&mut out)
        .expect("stdout should be readable");
    out.lines().map(str::to_owned).collect()
}

#[test]
fn serve_send_stop_round_trip() {
    let dir = unique_runtime_dir("round-trip");
    let mut server = spawn_server(&dir, "logger");

    let sent = run(&dir, &["send", "logger", "hello", "--tag", "app"]);
    assert!(sent.status.success(), "send failed: {sent:?}");
    let sent = run(&dir, &["send", "logger", "oops", "--severity", "error"]);
    assert!(sent.status.success(), "send failed: {sent:?}");
    let sent = run(&dir, &["send", "logger", "odd", "--severity", "99"]);
    assert!(sent.status.success(), "send failed: {sent:?}");

    let stopped = run(&dir, &["stop", "logger"]);
    assert!(stopped.status.success(), "stop failed: {stopped:?}");

    let status = wait_for_exit(&mut server, Duration::from_secs(5));
    assert!(status.success(), "server exit status: {status}");

    let lines = stdout_lines(&mut server);
    assert_eq!(lines.first().map(String::as_str), Some("Logger has been started."));
    assert!(lines[1].ends_with(" [INFO] app hello"), "got {lines:?}");
    assert!(lines[2].ends_with(" [ERROR] oops"), "got {lines:?}");
    assert!(lines[3].ends_with(" [UNKNOWN] odd"), "got {lines:?}");
    assert_eq!(lines[4], "Received shutdown pulse - stopping...");
    assert_eq!(lines[5], "Logger has been stopped.");

    assert!(!dir.join("logger.sock").exists(), "socket should be removed");
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn sigterm_stops_server_cleanly() {
    let dir = unique_runtime_dir("sigterm");
    let mut server = spawn_server(&dir, "logger");

    let status = Command::new("kill")
        .arg("-TERM")
        .arg(server.id().to_string())
        .status()
        .expect("kill should run");
    assert!(status.success());

    let status = wait_for_exit(&mut server, Duration::from_secs(5));
    assert!(status.success(), "server exit status: {status}");
    let lines = stdout_lines(&mut server);
    assert_eq!(lines, vec!["Logger has been started.", "Logger has been stopped."]);
    assert!(!dir.join("logger.sock").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn second_server_on_same_name_is_rejected() {
    let dir = unique_runtime_dir("dup");
    let mut first = spawn_server(&dir, "logger");

    let second = run(&dir, &["serve", "logger"]);
    assert_eq!(second.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("error: bind failed"), "stderr: {stderr}");

    assert!(run(&dir, &["stop", "logger"]).status.success());
    wait_for_exit(&mut first, Duration::from_secs(5));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn send_without_server_fails_with_transport_code() {
    let dir = unique_runtime_dir("no-server");
    let out = run(&dir, &["send", "logger", "nobody"]);
    assert_eq!(out.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_channel_name_is_a_usage_error() {
    let dir = unique_runtime_dir("bad-name");
    let out = run(&dir, &["serve", "bad/name"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(std::fs::read_dir(&dir)
        .expect("runtime dir")
        .next()
        .is_none());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn info_reports_absent_channel() {
    let dir = unique_runtime_dir("info");
    let out = run(&dir, &["--format", "json", "info", "logger"]);
    assert!(out.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("info output should be JSON");
    assert_eq!(report["channel"], "logger");
    assert_eq!(report["registered"], false);
    assert_eq!(report["live"], false);
    assert!(report["path"]
        .as_str()
        .expect("path is a string")
        .ends_with("logger.sock"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn serve_to_file() {
    let dir = unique_runtime_dir("file");
    let log = dir.join("out/app.log");
    let mut server = pulselog(&dir)
        .arg("serve")
        .arg("filelog")
        .arg("--file")
        .arg(&log)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve command should start");
    wait_for_live(&dir, "filelog", Duration::from_secs(5));

    assert!(run(&dir, &["send", "filelog", "persisted"]).status.success());
    assert!(run(&dir, &["stop", "filelog"]).status.success());
    assert!(wait_for_exit(&mut server, Duration::from_secs(5)).success());

    let contents = std::fs::read_to_string(&log).expect("log file should exist");
    assert!(contents.contains(" [INFO] persisted\n"), "log: {contents}");
    assert!(contents.ends_with("Logger has been stopped.\n"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn demo_runs_to_completion() {
    let dir = unique_runtime_dir("demo");
    let out = run(&dir, &["demo", "--items", "3", "--delay", "1ms"]);
    assert!(out.status.success(), "demo failed: {out:?}");

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[INFO] demo Demo application started"));
    assert!(stdout.contains("[ERROR] demo Simulated error occurred!"));
    assert!(stdout.contains("[INFO] demo Performance test message 9"));
    assert!(stdout.contains("Received shutdown pulse - stopping..."));
    assert!(stdout.contains("=== Demo completed ==="));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn version_prints_package_version() {
    let dir = unique_runtime_dir("version");
    let out = run(&dir, &["version"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        format!("pulselog {}", env!("CARGO_PKG_VERSION"))
    );
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn extended_version_reports_channel_defaults_as_json() {
    let dir = unique_runtime_dir("version-extended");
    let out = run(&dir, &["--format", "json", "version", "--extended"]);
    assert!(out.status.success());
    let info: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("extended version should be JSON");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["default_channel"], "logger");
    assert_eq!(info["max_text_len"], 5118);
    assert_eq!(info["runtime_dir"], dir.display().to_string());
    assert_eq!(info["log_filter_env"], "PULSELOG_LOG");
    let _ = std::fs::remove_dir_all(dir);
}
