use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pulselog_client::{global, log_error, log_info, ClientConfig, LogClient};
use pulselog_frame::{pulse, NotificationWriter};
use pulselog_server::{
    ConsoleSink, LogRecordServer, MessageServer, ServerConfig, ServerState,
};
use pulselog_transport::{ChannelSender, Namespace};

use crate::cmd::{channel_name, parse_duration, DemoArgs};
use crate::exit::{
    frame_error, server_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
    TRANSPORT_ERROR,
};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const PERFORMANCE_MESSAGES: usize = 10;

pub fn run(args: DemoArgs, namespace: &Namespace) -> CliResult<i32> {
    let name = channel_name(&args.name)?;
    let delay = parse_duration(&args.delay)?;

    println!("=== pulselog demo ===");

    let server = Arc::new(
        MessageServer::bind(namespace, &name, ServerConfig::default())
            .map_err(|err| server_error("bind failed", err))?,
    );
    let server_thread = {
        let server = Arc::clone(&server);
        thread::Builder::new()
            .name("pulselog-demo-server".into())
            .spawn(move || LogRecordServer::new(ConsoleSink::new()).serve(&server))
            .map_err(|err| CliError::new(INTERNAL, format!("server thread failed: {err}")))?
    };
    wait_until_running(&server)?;

    let config = ClientConfig::new(name.clone())
        .with_namespace(namespace.clone())
        .with_tag("demo");
    if !global::initialize(LogClient::new(config)) {
        return Err(CliError::new(INTERNAL, "log client was already initialized"));
    }
    if !global::instance().is_some_and(LogClient::is_connected) {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("cannot reach demo server at {}", server.path().display()),
        ));
    }

    println!("Logger started. Starting demo...");
    println!();
    run_application(args.items, delay);

    println!();
    println!("--- Performance demo ---");
    let start = Instant::now();
    for i in 0..PERFORMANCE_MESSAGES {
        log_info!("Performance test message {i}");
    }
    log_info!(
        "Logged {PERFORMANCE_MESSAGES} messages in {}ms",
        start.elapsed().as_millis()
    );

    println!("Stopping logger...");
    let sender = ChannelSender::open(namespace, &name)
        .map_err(|err| transport_error("connect failed", err))?;
    NotificationWriter::new(sender)
        .send_pulse(pulse::SHUTDOWN, 0)
        .map_err(|err| frame_error("send failed", err))?;

    server_thread
        .join()
        .map_err(|_| CliError::new(INTERNAL, "server thread panicked"))?
        .map_err(|err| server_error("serve failed", err))?;

    println!();
    println!("=== Demo completed ===");
    Ok(SUCCESS)
}

fn run_application(items: usize, delay: Duration) {
    log_info!("Demo application started");
    for i in 0..items {
        log_info!("Processing item {i}");
        thread::sleep(delay);
        if i == 2 {
            log_error!("Simulated error occurred!");
        }
    }
    log_info!("Demo application finished");
}

fn wait_until_running(server: &MessageServer) -> CliResult<()> {
    let start = Instant::now();
    while server.state() == ServerState::Idle {
        if start.elapsed() >= STARTUP_TIMEOUT {
            return Err(CliError::new(
                crate::exit::TIMEOUT,
                format!("server did not start within {STARTUP_TIMEOUT:?}"),
            ));
        }
        thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}
