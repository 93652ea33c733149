//! Command line front end.
//!
//! Parses arguments, wires them into the schema database configuration, and
//! runs the schema compiler. Diagnostics go to stderr with `INFO:` /
//! `WARNING:` / `ERROR:` prefixes; a trailing `SUCCESS` line is printed on
//! success and any failure exits with code 255.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use sbeforge_schema::{Config, parse_schema};

#[derive(Debug, Parser)]
#[command(name = "sbeforge", disable_version_flag = true)]
#[command(about = "Compiles an SBE XML schema into comms protocol definitions")]
struct Args {
    /// Schema file to compile.
    schema_file: Option<PathBuf>,

    /// Output directory path. Empty means current.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force protocol namespace. Defaults to package name defined in the
    /// schema.
    #[arg(short, long)]
    namespace: Option<String>,

    /// Force schema version. Must not be greater than version specified in
    /// schema file.
    #[arg(short = 'V', long)]
    force_version: Option<u32>,

    /// Set minimal supported remote version.
    #[arg(short, long, default_value_t = 0)]
    min_remote_version: u32,

    /// Tag/branch of the comms library forwarded to build metadata.
    #[arg(long, default_value = "master")]
    cc_tag: String,

    /// Name of the open framing header composite type.
    #[arg(long)]
    sofh_name: Option<String>,
}

/// One-line diagnostics with the classic level prefixes.
struct DiagFormat;

impl<S, N> FormatEvent<S, N> for DiagFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        let label = if level == Level::ERROR {
            "ERROR"
        } else if level == Level::WARN {
            "WARNING"
        } else if level == Level::INFO {
            "INFO"
        } else {
            "DEBUG"
        };
        write!(writer, "{label}: ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(DiagFormat)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    let Some(schema_file) = args.schema_file else {
        tracing::error!("message schema hasn't been provided");
        return ExitCode::from(255);
    };

    let config = Config {
        output_dir: args.output_dir,
        namespace: args.namespace,
        force_version: args.force_version,
        min_remote_version: args.min_remote_version,
        cc_tag: args.cc_tag,
        sofh_name: args.sofh_name,
    };

    match parse_schema(&schema_file, &config) {
        Ok(_db) => {
            println!("SUCCESS");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(255)
        }
    }
}
