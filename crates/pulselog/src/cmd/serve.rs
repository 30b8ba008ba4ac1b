use pulselog_server::{
    ConsoleSink, FileSink, LogRecordServer, MessageServer, ServerConfig, StopReason,
};
use pulselog_transport::Namespace;
use tracing::info;

use crate::cmd::{channel_name, ServeArgs};
use crate::exit::{server_error, CliResult, FAILURE, SUCCESS};

pub fn run(args: ServeArgs, namespace: &Namespace) -> CliResult<i32> {
    let name = channel_name(&args.name)?;
    let server = MessageServer::bind(namespace, &name, ServerConfig::default())
        .map_err(|err| server_error("bind failed", err))?;
    info!(channel = %name, path = ?server.path(), "log server registered");

    let outcome = match &args.file {
        Some(path) => {
            let sink = FileSink::open(path).map_err(|err| server_error("sink failed", err))?;
            LogRecordServer::new(sink).serve(&server)
        }
        None => LogRecordServer::new(ConsoleSink::new()).serve(&server),
    };

    match outcome.map_err(|err| server_error("serve failed", err))? {
        StopReason::FatalError => Ok(FAILURE),
        StopReason::Stopped | StopReason::ShutdownRequested => Ok(SUCCESS),
    }
}
