mod logging;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mailgate_core::config::DEFAULT_STORE_PATH;
use mailgate_core::{FrequencyPolicy, NotifierConfig, Recipient};
use mailgate_notify::{Notifier, NotifyError, Outcome};
use mailgate_sendgrid::SendGridClient;
use mailgate_store::RecordStore;

#[derive(Parser)]
#[command(name = "mailgate", version, about = "Deduplicating email notifier")]
struct Cli {
    /// Append logs to this file instead of stdout.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a notification unless it was already sent in the current window.
    Send(SendArgs),
    /// List every recorded dedup key and the subject last sent under it.
    Records {
        #[arg(long, default_value = DEFAULT_STORE_PATH)]
        store: PathBuf,
    },
}

#[derive(Args)]
struct SendArgs {
    #[arg(long)]
    subject: String,

    #[arg(long, default_value = "", conflicts_with = "body_file")]
    body: String,

    /// Read the body from a file, or `-` for stdin.
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Recipient as `Name <addr>` or `addr`. Repeatable.
    #[arg(long = "to", required = true)]
    to: Vec<Recipient>,

    #[arg(long)]
    from: Option<Recipient>,

    /// always, once-per-hour (hourly) or once-per-day (daily).
    #[arg(long, default_value = "always")]
    frequency: FrequencyPolicy,

    #[arg(long)]
    tag: Option<String>,

    /// Record store path.
    #[arg(long)]
    store: Option<PathBuf>,

    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "SENDGRID_API_HOST")]
    api_host: Option<String>,
}

impl SendArgs {
    fn to_config(&self) -> NotifierConfig {
        NotifierConfig {
            api_host: self.api_host.clone(),
            api_key: self.api_key.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            frequency: self.frequency,
            tag: self.tag.clone(),
            store_path: self.store.clone(),
        }
    }

    fn read_body(&self) -> anyhow::Result<String> {
        match self.body_file.as_deref() {
            None => Ok(self.body.clone()),
            Some(p) if p == Path::new("-") => {
                let mut body = String::new();
                std::io::stdin()
                    .read_to_string(&mut body)
                    .context("reading body from stdin")?;
                Ok(body)
            }
            Some(p) => std::fs::read_to_string(p)
                .with_context(|| format!("reading body from {}", p.display())),
        }
    }
}

/// Build the SendGrid-backed notifier. Configuration errors are logged
/// before they are returned so they reach the log sink.
fn build_notifier(args: &SendArgs) -> anyhow::Result<Notifier<SendGridClient>> {
    let config = args.to_config();
    let resolved = config.resolve().inspect_err(|e| {
        tracing::error!(error = %e, "invalid notifier configuration, nothing sent");
    });
    let resolved = resolved.context("invalid notifier configuration")?;
    let transport = SendGridClient::new(resolved.api_host, resolved.api_key);
    Ok(Notifier::new(config, transport))
}

async fn send(args: SendArgs) -> anyhow::Result<()> {
    let notifier = build_notifier(&args)?;

    let body = args.read_body()?;
    match notifier.send(&args.subject, &body).await {
        Ok(Outcome::Sent { key, recipients }) => {
            println!("sent {key} to {recipients} recipient(s)");
            Ok(())
        }
        Ok(Outcome::Skipped { key }) => {
            println!("skipped {key}");
            Ok(())
        }
        Err(e @ NotifyError::RecordPersistFailed { .. }) => {
            Err(e).context("message was delivered, but a repeat may not be suppressed")
        }
        Err(e) => Err(e).context("notification not sent"),
    }
}

fn records(store: &Path) -> anyhow::Result<()> {
    // Listing must not create the store as `load` would.
    if !store.exists() {
        println!("no records in {}", store.display());
        return Ok(());
    }
    let records = RecordStore::new(store)
        .load()
        .with_context(|| format!("loading record store {}", store.display()))?;
    if records.is_empty() {
        println!("no records in {}", store.display());
        return Ok(());
    }
    let width = records.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, subject) in &records {
        println!("{key:<width$}  {subject}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;
    tracing::debug!("mailgate v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Send(args) => send(args).await,
        Command::Records { store } => records(&store),
    }
}
