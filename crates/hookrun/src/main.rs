use std::process::ExitCode;

use clap::Parser;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hookrun::cli::{normalize_args, Cli};
use hookrun::config::{FileConfig, Settings};
use hookrun::error::EXIT_USAGE;
use hookrun::exec::{self, Invocation};
use hookrun::message;
use hookrun::sink::post_webhook;
use hookrun::{Error, Result};

const LOG_ENV: &str = "HOOKRUN_LOG";

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            return ExitCode::from(EXIT_USAGE);
        }
        // --help / --version
        Err(err) => err.exit(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hookrun: {err}");
            if let Some(body) = err.response_body() {
                eprintln!("{body}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file)?;
    let invocation = Invocation::from_argv(&cli.command).ok_or(Error::MissingCommand)?;

    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    rt.block_on(async {
        let outcome = exec::run(&invocation, settings.verbose).await;
        if let Some(failure) = &outcome.failure {
            // Echoed locally; delivery still proceeds.
            eprintln!("{failure}");
            warn!(exe = %invocation.exe, "command failed");
        }

        let msg = message::build(&settings, &invocation, &outcome);
        post_webhook(&settings.hook, &msg).await
    })
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("hookrun=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
