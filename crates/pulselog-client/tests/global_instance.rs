#![cfg(unix)]

//! The global client can be installed once per process, so this binary holds
//! a single test.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pulselog_client::{global, log_error, log_info, ClientConfig, LogClient};
use pulselog_server::{LogRecordServer, MemorySink, MessageServer, ServerConfig, ServerState};
use pulselog_transport::Namespace;

#[test]
fn first_initialize_wins_and_macros_use_it() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ns = Namespace::new(dir.path());

    // Before initialization the macros are no-ops.
    assert!(global::instance().is_none());
    log_info!("nobody is listening");

    let server = Arc::new(
        MessageServer::bind_str(&ns, "logger", ServerConfig::without_signals())
            .expect("server should bind"),
    );
    let sink = MemorySink::new();
    let handle = {
        let server = Arc::clone(&server);
        let sink = sink.clone();
        thread::spawn(move || LogRecordServer::with_clock(sink, || "T".to_owned()).serve(&server))
    };
    let start = Instant::now();
    while server.state() != ServerState::Running {
        assert!(start.elapsed() < Duration::from_secs(3), "server did not start");
        thread::sleep(Duration::from_millis(5));
    }

    let config = |tag: &str| {
        ClientConfig::default_channel()
            .expect("default channel name is valid")
            .with_namespace(ns.clone())
            .with_tag(tag)
    };
    assert!(global::initialize(LogClient::new(config("first"))));
    assert!(!global::initialize(LogClient::new(config("second"))));
    assert!(global::is_initialized());

    let instance = global::instance().expect("instance installed");
    assert_eq!(instance.tag(), "first");
    assert!(instance.is_connected(), "initialize connects eagerly");

    log_info!("worker {} up", 3);
    log_error!("disk {}", "full");

    server.stop();
    handle.join().expect("server thread").expect("serve");
    assert_eq!(
        sink.lines(),
        vec![
            "Logger has been started.",
            "T [INFO] first worker 3 up",
            "T [ERROR] first disk full",
            "Logger has been stopped.",
        ]
    );
}
