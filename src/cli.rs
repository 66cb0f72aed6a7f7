use clap::{Parser, Subcommand};

/// Stream files to HTTP endpoints as multipart/form-data
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Show debug output, including upload diagnostics
    #[clap(short, long, global = true)]
    pub verbose: bool,
    /// Subcommand
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file
    Upload {
        file: String,
        /// Endpoint name, or raw:<url>. Uses the default endpoint if unspecified.
        #[clap(short)]
        endpoint: Option<String>,
        /// Form field name the file is sent under
        #[clap(short = 'n', long)]
        field_name: Option<String>,
        /// Extra form field, sent after the file in the given order
        #[clap(short = 'F', long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// Correlation id for diagnostics. A random one is used if unspecified.
        #[clap(short, long)]
        trace_id: Option<String>,
        /// Log upload diagnostics for this upload
        #[clap(long)]
        debug: bool,
    },
    /// Manage endpoints
    Endpoint {
        #[clap(subcommand)]
        command: EndpointCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum EndpointCommand {
    /// Add a new endpoint
    Add { name: String, url: String },
    /// Delete an endpoint
    Delete { name: String },
    /// List endpoints
    List,
    /// Set an endpoint as the default
    Default { name: String },
}

impl Args {
    /// Whether upload diagnostics should be attached and shown.
    pub fn debug_upload(&self) -> bool {
        self.verbose || matches!(self.command, Command::Upload { debug: true, .. })
    }
}

fn parse_field(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{arg}'"));
    }
    Ok((key.into(), value.into()))
}
