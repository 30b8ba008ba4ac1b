use pulselog_client::DEFAULT_CHANNEL;
use pulselog_frame::{pulse, MAX_TEXT_LEN};
use pulselog_transport::{Namespace, RUNTIME_DIR_ENV};
use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::logging::LOG_FILTER_ENV;
use crate::output::{display_path, OutputFormat};

/// Build details plus the defaults a client and server must agree on.
#[derive(Debug, Serialize)]
struct BuildInfo {
    version: &'static str,
    build_target: &'static str,
    default_channel: &'static str,
    runtime_dir: String,
    runtime_dir_env: &'static str,
    log_filter_env: &'static str,
    max_text_len: usize,
    shutdown_pulse: i8,
    user_pulse_start: i8,
}

impl BuildInfo {
    fn collect(namespace: &Namespace) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_target: option_env!("PULSELOG_BUILD_TARGET").unwrap_or("unknown"),
            default_channel: DEFAULT_CHANNEL,
            runtime_dir: display_path(namespace.root()),
            runtime_dir_env: RUNTIME_DIR_ENV,
            log_filter_env: LOG_FILTER_ENV,
            max_text_len: MAX_TEXT_LEN,
            shutdown_pulse: pulse::SHUTDOWN,
            user_pulse_start: pulse::USER_CODE_START,
        }
    }
}

pub fn run(args: VersionArgs, namespace: &Namespace, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("pulselog {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let info = BuildInfo::collect(namespace);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pulselog {} ({})", info.version, info.build_target);
            println!("  Default channel:  {}", info.default_channel);
            println!("  Runtime dir:      {} (${})", info.runtime_dir, info.runtime_dir_env);
            println!("  Log filter env:   ${}", info.log_filter_env);
            println!("  Max record text:  {} bytes", info.max_text_len);
            println!(
                "  Pulse codes:      shutdown={}, user codes from {}",
                info.shutdown_pulse, info.user_pulse_start
            );
        }
    }
    Ok(SUCCESS)
}
