use clap::Parser;
use color_eyre::eyre::WrapErr;

use stashhook::backends::bitbucket::{
    CodebaseStrategy, ReporterOptions, StatusReporter, WebhookEventNormalizer, WebhookRequest,
};
use stashhook::build::Build;
use stashhook::cmdargs::{Args, ReportCommand, SubCommand};
use stashhook::config::{Config, ConfigError};
use stashhook::http::start_server;
use stashhook::logging::TracingSetup;
use stashhook::service::ServiceHandler;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> color_eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install().ok();

    let args = Args::parse();
    let config = build_configuration(&args)?;

    TracingSetup::with_setup(config, |config| async move {
        match args.command {
            SubCommand::Serve => {
                let normalizer = build_normalizer(&config);
                start_server(config, normalizer).await?
            }
            SubCommand::Report(report_args) => {
                let config = build_reporter_configuration(config, &report_args)?;
                let build = Build::from_file(&report_args.build)?;
                let services = ServiceHandler::new_defaults(&config)?;
                let reporter = StatusReporter::new(ReporterOptions::from_config(&config), services);

                let outcome = reporter.send(&build).await;
                tracing::info!(
                    statuses_sent = outcome.statuses_sent,
                    comment_sent = outcome.comment_sent,
                    errors = outcome.errors.len(),
                    "Build reported"
                );
            }
            SubCommand::Normalize(normalize_args) => {
                let body = std::fs::read_to_string(&normalize_args.payload).wrap_err_with(|| {
                    format!(
                        "could not read payload file '{}'",
                        normalize_args.payload.display()
                    )
                })?;
                let request = WebhookRequest::new(
                    normalize_args.event,
                    normalize_args.content_type,
                    body,
                );

                let batch = build_normalizer(&config).process(&request)?;
                println!("{}", serde_json::to_string_pretty(&batch)?);
            }
        }

        Ok(())
    })
    .await
}

fn build_configuration(args: &Args) -> Result<Config, ConfigError> {
    let mut config = Config::from_env();

    if let Some(t) = &args.telemetry_url {
        config.set_telemetry_url(t.clone());
    }

    if let Some(u) = &args.bitbucket_url {
        config.set_bitbucket_url(u.clone());
    }

    if let Some(u) = &args.user {
        config.set_bitbucket_user(u.clone());
    }

    if let Some(p) = &args.password {
        config.set_bitbucket_password(p.clone());
    }

    if let Some(c) = &args.codebase {
        config.set_codebase(c.clone());
    }

    if let Some(b) = &args.bind_ip {
        config.set_bind_ip(b.clone());
    }

    if args.verbose {
        config.set_verbose(true);
    }

    config.validate_configuration().map(|_| config)
}

fn build_reporter_configuration(
    mut config: Config,
    args: &ReportCommand,
) -> Result<Config, ConfigError> {
    if let Some(k) = &args.key {
        config.set_status_key(k.clone());
    }

    if let Some(n) = &args.status_name {
        config.set_status_name(n.clone());
    }

    if let Some(d) = &args.start_description {
        config.set_start_description(d.clone());
    }

    if let Some(d) = &args.end_description {
        config.set_end_description(d.clone());
    }

    if let Some(t) = &args.text {
        config.set_comment_text(t.clone());
    }

    if args.no_comments {
        config.set_pull_request_comments(false);
    }

    config.validate_reporter_configuration().map(|_| config)
}

fn build_normalizer(config: &Config) -> WebhookEventNormalizer {
    let codebase = match config.codebase() {
        Some(c) => CodebaseStrategy::Fixed(c.to_owned()),
        None => CodebaseStrategy::None,
    };

    WebhookEventNormalizer::new(codebase)
}
