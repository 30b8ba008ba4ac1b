use pulselog_transport::{ChannelSender, Namespace};

use crate::cmd::{channel_name, InfoArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{display_path, print_report, ChannelReport, OutputFormat};

pub fn run(args: InfoArgs, namespace: &Namespace, format: OutputFormat) -> CliResult<i32> {
    let name = channel_name(&args.name)?;
    let path = namespace.channel_path(&name);

    let report = ChannelReport {
        channel: name.to_string(),
        runtime_dir: display_path(namespace.root()),
        path: display_path(&path),
        registered: path.exists(),
        live: ChannelSender::open(namespace, &name).is_ok(),
    };

    print_report(&report, format);
    Ok(SUCCESS)
}
