use pulselog_client::{ClientConfig, LogClient};
use pulselog_transport::Namespace;
use tracing::debug;

use crate::cmd::{channel_name, parse_duration, SendArgs};
use crate::exit::{client_error, CliResult, SUCCESS};

pub fn run(args: SendArgs, namespace: &Namespace) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = ClientConfig::new(channel_name(&args.name)?)
        .with_namespace(namespace.clone())
        .with_tag(args.tag.unwrap_or_default())
        .with_reply_timeout(Some(timeout));

    let written = LogClient::new(config)
        .try_send(args.severity, &args.message)
        .map_err(|err| client_error("send failed", err))?;
    debug!(bytes = written, severity = %args.severity, "record delivered");

    Ok(SUCCESS)
}
