use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Command, EndpointCommand};

fn main() -> Result<()> {
    color_eyre::config::HookBuilder::default().display_env_section(false).install()?;
    let cli = cli::Args::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.debug_upload() { "streamupload=debug" } else { "streamupload=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let debug = cli.debug_upload();
    match cli.command {
        Command::Upload {
            file,
            endpoint,
            field_name,
            fields,
            trace_id,
            ..
        } => commands::upload(
            &file,
            endpoint.as_deref(),
            field_name.as_deref(),
            &fields,
            trace_id,
            debug,
        ),
        Command::Endpoint { command } => match command {
            EndpointCommand::Add { name, url } => commands::endpoint_add(name, url),
            EndpointCommand::Delete { name } => commands::endpoint_delete(&name),
            EndpointCommand::List => commands::endpoint_list(),
            EndpointCommand::Default { name } => commands::endpoint_default(name),
        },
    }
}
