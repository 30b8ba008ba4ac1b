use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use pulselog_frame::Severity;
use pulselog_transport::{ChannelName, Namespace};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod demo;
pub mod info;
pub mod pulse;
pub mod send;
pub mod serve;
pub mod stop;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a log server on a channel until stopped.
    Serve(ServeArgs),
    /// Send a single log record.
    Send(SendArgs),
    /// Ask a log server to shut down.
    Stop(StopArgs),
    /// Send an arbitrary pulse.
    Pulse(PulseArgs),
    /// Report where a channel lives and whether a server holds it.
    Info(InfoArgs),
    /// Run an in-process server and log a short demo sequence to it.
    Demo(DemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, namespace: &Namespace, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, namespace),
        Command::Send(args) => send::run(args, namespace),
        Command::Stop(args) => stop::run(args, namespace),
        Command::Pulse(args) => pulse::run(args, namespace),
        Command::Info(args) => info::run(args, namespace, format),
        Command::Demo(args) => demo::run(args, namespace),
        Command::Version(args) => version::run(args, namespace, format),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Channel name to register.
    #[arg(default_value = "logger")]
    pub name: String,
    /// Append log lines to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Channel name of the log server.
    pub name: String,
    /// Message text.
    pub message: String,
    /// Record severity: info, error or a raw code 0-255.
    #[arg(long, short = 's', default_value = "info")]
    pub severity: Severity,
    /// Tag prepended to the message.
    #[arg(long, short = 't')]
    pub tag: Option<String>,
    /// How long to wait for the server to take the record (e.g. 2s, 500ms; 0
    /// waits forever).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Channel name of the log server.
    #[arg(default_value = "logger")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct PulseArgs {
    /// Channel name of the server.
    pub name: String,
    /// Pulse code (-128..=127).
    #[arg(long, allow_hyphen_values = true)]
    pub code: i8,
    /// Pulse value.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub value: i32,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Channel name to inspect.
    #[arg(default_value = "logger")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Channel name the demo server registers.
    #[arg(long, default_value = "logger")]
    pub name: String,
    /// Number of work items the demo application processes.
    #[arg(long, default_value_t = 5)]
    pub items: usize,
    /// Pause between work items (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub delay: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details and the channel defaults this build uses.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn channel_name(name: &str) -> CliResult<ChannelName> {
    ChannelName::new(name).map_err(|err| transport_error("invalid channel", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
