use pulselog_frame::{pulse, NotificationWriter};
use pulselog_transport::{ChannelSender, Namespace};
use tracing::debug;

use crate::cmd::{channel_name, PulseArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};

pub fn run(args: PulseArgs, namespace: &Namespace) -> CliResult<i32> {
    let name = channel_name(&args.name)?;
    let sender = ChannelSender::open(namespace, &name)
        .map_err(|err| transport_error("connect failed", err))?;

    debug!(
        code = args.code,
        value = args.value,
        kind = pulse::pulse_name(args.code),
        "sending pulse"
    );
    NotificationWriter::new(sender)
        .send_pulse(args.code, args.value)
        .map_err(|err| frame_error("send failed", err))?;
    Ok(SUCCESS)
}
