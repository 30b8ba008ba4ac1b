use pulselog_frame::{pulse, NotificationWriter};
use pulselog_transport::{ChannelSender, Namespace};

use crate::cmd::{channel_name, StopArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};

pub fn run(args: StopArgs, namespace: &Namespace) -> CliResult<i32> {
    let name = channel_name(&args.name)?;
    let sender = ChannelSender::open(namespace, &name)
        .map_err(|err| transport_error("connect failed", err))?;
    NotificationWriter::new(sender)
        .send_pulse(pulse::SHUTDOWN, 0)
        .map_err(|err| frame_error("send failed", err))?;
    Ok(SUCCESS)
}
