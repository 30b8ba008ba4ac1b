mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use pulselog_transport::{Namespace, RUNTIME_DIR_ENV};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pulselog", version, about = "Message-passing log service")]
struct Cli {
    /// Directory holding channel sockets.
    #[arg(long, value_name = "DIR", env = RUNTIME_DIR_ENV, global = true)]
    runtime_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let namespace = cli
        .runtime_dir
        .map(Namespace::new)
        .unwrap_or_else(Namespace::from_env);
    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &namespace, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use pulselog_frame::Severity;

    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "pulselog",
            "send",
            "logger",
            "hello there",
            "--severity",
            "error",
            "--tag",
            "app",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.severity, Severity::Error);
                assert_eq!(args.tag.as_deref(), Some("app"));
                assert_eq!(args.message, "hello there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn raw_severity_codes_parse() {
        let cli = Cli::try_parse_from(["pulselog", "send", "logger", "x", "-s", "57"])
            .expect("numeric severity should parse");
        match cli.command {
            Command::Send(args) => assert_eq!(args.severity, Severity::Other(57)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_severity() {
        let err = Cli::try_parse_from(["pulselog", "send", "logger", "x", "-s", "loud"])
            .expect_err("unknown severity should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn pulse_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "pulselog", "pulse", "logger", "--code", "-1", "--value", "-42",
        ])
        .expect("negative pulse args should parse");
        match cli.command {
            Command::Pulse(args) => {
                assert_eq!(args.code, -1);
                assert_eq!(args.value, -42);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn runtime_dir_is_global() {
        let cli = Cli::try_parse_from(["pulselog", "info", "--runtime-dir", "/tmp/pl-x"])
            .expect("info args should parse");
        assert_eq!(cli.runtime_dir, Some(PathBuf::from("/tmp/pl-x")));
        assert!(matches!(cli.command, Command::Info(_)));
    }
}
