use std::io::IsTerminal;
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What `pulselog info` reports about one channel.
#[derive(Debug, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub runtime_dir: String,
    pub path: String,
    /// A socket file exists at `path`.
    pub registered: bool,
    /// A server accepted a probe on `path`.
    pub live: bool,
}

impl ChannelReport {
    pub fn status(&self) -> &'static str {
        match (self.registered, self.live) {
            (_, true) => "live",
            (true, false) => "stale",
            (false, false) => "absent",
        }
    }
}

pub fn print_report(report: &ChannelReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "STATUS", "PATH"])
                .add_row(vec![
                    report.channel.clone(),
                    report.status().to_string(),
                    report.path.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Channel Info:");
            println!("  Channel:      {}", report.channel);
            println!("  Runtime dir:  {}", report.runtime_dir);
            println!("  Socket:       {}", report.path);
            println!("  Status:       {}", report.status());
        }
    }
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
