use std::path::PathBuf;

use clap::Parser;

/// Bridge between Bitbucket Server and a CI server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Telemetry URL (disabled as default)
    #[clap(long)]
    pub telemetry_url: Option<String>,

    /// Bitbucket Server base URL
    #[clap(long)]
    pub bitbucket_url: Option<String>,

    /// Bitbucket Server username
    #[clap(long)]
    pub user: Option<String>,

    /// Bitbucket Server password or token
    #[clap(long)]
    pub password: Option<String>,

    /// Codebase attached to every change (none as default)
    #[clap(long)]
    pub codebase: Option<String>,

    /// Log every status successfully sent
    #[clap(long)]
    pub verbose: bool,

    /// Bind IP
    #[clap(long)]
    pub bind_ip: Option<String>,

    /// Command
    #[clap(subcommand)]
    pub command: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Run webhook server
    Serve,
    /// Send build status for a build document
    Report(ReportCommand),
    /// Convert a webhook payload to changes
    Normalize(NormalizeCommand),
}

#[derive(Parser, Debug)]
pub struct ReportCommand {
    /// Path to the build JSON document
    #[clap(long)]
    pub build: PathBuf,

    /// Status key template (%(prop:buildername)s as default)
    #[clap(long)]
    pub key: Option<String>,

    /// Status name template
    #[clap(long)]
    pub status_name: Option<String>,

    /// Description used while the build runs
    #[clap(long)]
    pub start_description: Option<String>,

    /// Description used once the build is complete
    #[clap(long)]
    pub end_description: Option<String>,

    /// Pull request comment template
    #[clap(long)]
    pub text: Option<String>,

    /// Do not comment on pull requests
    #[clap(long)]
    pub no_comments: bool,
}

#[derive(Parser, Debug)]
pub struct NormalizeCommand {
    /// Event key, as sent in the X-Event-Key header (e.g. repo:push)
    #[clap(long)]
    pub event: String,

    /// Payload content type
    #[clap(long, default_value = "application/json")]
    pub content_type: String,

    /// Path to the payload file
    pub payload: PathBuf,
}
