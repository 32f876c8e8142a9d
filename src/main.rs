use anyhow::{Context, Result};
use clap::Parser;
use pvetop::*;
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let defaults = config::CredentialDefaults::load()?;

    // Stored hostname/username fill the two leading positionals, as if the
    // user had typed them first. Only the pair counts; a lone value is
    // ignored so the CLI still demands both.
    let mut argv: Vec<OsString> = std::env::args_os().collect();
    if let Some((host, user)) = defaults.host_and_user() {
        argv.splice(1..1, [OsString::from(host), OsString::from(user)]);
    }
    let cli = cli::Cli::parse_from(argv);

    let password = match defaults.password {
        Some(p) => p,
        None => rpassword::prompt_password(format!("password for {}: ", cli.username))
            .context("reading password")?,
    };

    tracing::info!("logging in to {} as {}", cli.hostname, cli.username);
    let repo = proxmox_repo::ProxmoxRepo::login(&cli.hostname, &cli.username, &password)
        .await
        .context("login failed")?;

    let (usage, anomalies) = fetcher::fetch_usage(
        &repo,
        cli.timeframe,
        cli.aggregation,
        &cli.only_vms,
        cli.partial_match,
    )
    .await?;

    report::print_report(&usage, &anomalies, cli.top, cli.timeframe, cli.aggregation);
    Ok(())
}
