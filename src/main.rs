use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use tokio::sync::mpsc;

use identity_timeline::action::Action;
use identity_timeline::client::{HistoryClient, HttpHistoryClient};
use identity_timeline::config::{Cli, ConfigFile, Settings};
use identity_timeline::domain::{Event, EventPayload};
use identity_timeline::group::{badge_label, OrderedGroups};
use identity_timeline::labels::{AttributeCatalog, LabelCatalog};
use identity_timeline::session::HistorySession;
use identity_timeline::worker::HistoryWorker;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    let _log_guard = match cli.log_file {
        Some(ref log_file) => {
            let file = std::fs::File::create(log_file)
                .wrap_err_with(|| format!("failed to create log file {}", log_file))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_writer(writer)
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();
            Some(guard)
        }
        None => None,
    };

    let settings = Settings::resolve(cli, ConfigFile::load().unwrap_or_default());
    run(settings).await
}

async fn run(settings: Settings) -> Result<()> {
    let labels = match settings.labels {
        Some(ref path) => LabelCatalog::load(path)?,
        None => LabelCatalog::default(),
    };
    let attributes = match settings.referential {
        Some(ref path) => AttributeCatalog::load(path)?,
        None => AttributeCatalog::default(),
    };

    let client: Arc<dyn HistoryClient> = Arc::new(HttpHistoryClient::new(
        &settings.base_url,
        &settings.identity_path,
        settings.timeout,
    )?);

    let mut session: HistorySession = HistorySession::new(labels, attributes, settings.timeline);

    // Set up channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create worker
    let (worker, handle) = HistoryWorker::new(client, action_tx);
    tokio::spawn(worker.run());

    handle.load(session.begin_load(&settings.customer_id));

    // Wait for the completion of the current load; stale ones are dropped
    while let Some(action) = action_rx.recv().await {
        let current = session.is_current(action.ticket());
        let failed = matches!(action, Action::HistoryFailed { .. });
        if let Err(e) = session.apply(action) {
            tracing::warn!("{}", e);
        }
        if current {
            if failed {
                break;
            }
            let events = session.query(settings.query.as_deref())?;
            let report = session.report()?;
            print_groups(&session, &session.group_for_display(events));
            if report.total_rejected() > 0 {
                eprintln!("{} malformed record(s) skipped", report.total_rejected());
            }
            return Ok(());
        }
    }

    Err(eyre!(
        "failed to load history for {}: {}",
        settings.customer_id,
        session
            .events()
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default()
    ))
}

fn print_groups(session: &HistorySession, groups: &OrderedGroups<'_>) {
    if groups.is_empty() {
        println!("(no matching history)");
        return;
    }

    for bucket in groups.buckets() {
        let badges: Vec<String> = bucket
            .badges()
            .into_iter()
            .map(|kind| badge_label(session.labels(), kind))
            .collect();
        println!("{}  [{}]", bucket.label, badges.join(", "));

        if let Some(header) = bucket.identity_header() {
            println!("  {}  ({})", header.change_type_text, header.author_name);
            if let Some(message) = header.change_message().filter(|m| !m.is_empty()) {
                println!("    {}", message);
            }
        }
        for row in bucket.attribute_rows() {
            println!(
                "  | {:<24} | {}",
                row.attribute_label().unwrap_or_default(),
                row.attribute_value().unwrap_or_default()
            );
        }
        for unit in bucket.task_units() {
            print_task(unit);
        }
        println!();
    }
}

fn print_task(event: &Event) {
    println!(
        "  * {}  ({})  [{}]",
        event.change_type_text,
        event.author_name,
        event.task_code().unwrap_or_default()
    );
    if let EventPayload::Task { task, .. } = &event.payload {
        for (key, value) in &task.metadata {
            println!("      {}: {}", key, value);
        }
    }
}
