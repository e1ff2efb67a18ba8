use anyhow::Context;
use dinox_core::{DinoxClient, SiyuanClient};
use dinox_sync::config::AppConfig;
use dinox_sync::sync::{Action, CheckpointStore, LocalClock, SyncEvent, SyncOrchestrator};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Sync,
    Reset,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Sync;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--reset" => mode = CliMode::Reset,
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mode = parse_cli_mode(std::env::args())?;
    if mode == CliMode::Help {
        println!("Usage: dinox-sync [--reset]");
        println!("  (no flag)  Mirror notes changed since the last sync");
        println!("  --reset    Forget sync history; the next sync imports everything");
        return Ok(());
    }
    init_tracing();
    // The local offset can only be read reliably before worker threads exist.
    let clock = LocalClock::detect();
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(mode, config, clock))
}

async fn run(mode: CliMode, config: AppConfig, clock: LocalClock) -> anyhow::Result<()> {
    let source = DinoxClient::with_base_url(&config.dinox_api_url)?;
    let store = SiyuanClient::with_base_url(&config.siyuan_api_url, config.siyuan_token.clone())?;
    let checkpoints = CheckpointStore::new(&config.checkpoint_path);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SyncEvent>();
    let orchestrator = SyncOrchestrator::new(source, store, checkpoints, config.settings)
        .with_clock(clock)
        .with_events(events_tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let Some(text) = notification(&event) {
                eprintln!("[dinox-sync] {text}");
            }
        }
    });

    let result = match mode {
        CliMode::Sync => orchestrator.run_sync().await.map(|_| ()),
        CliMode::Reset => orchestrator.reset().await,
        CliMode::Help => Ok(()),
    };
    drop(orchestrator);
    let _ = printer.await;
    Ok(result?)
}

/// Progress line for an event. Failures are left to the error `main` returns.
fn notification(event: &SyncEvent) -> Option<String> {
    let text = match event {
        SyncEvent::Started { since } if since.is_sentinel() => {
            "full import started; do not start another sync meanwhile".to_string()
        }
        SyncEvent::Started { since } => format!("syncing notes changed since {since}"),
        SyncEvent::Fetched { days, notes } => {
            format!("fetched {notes} notes across {days} days, writing")
        }
        SyncEvent::NoteApplied { path, action } => match action {
            Action::Created => format!("created {path}"),
            Action::Replaced { .. } => format!("replaced {path}"),
            Action::Removed { .. } => format!("removed {path}"),
            Action::Skipped | Action::AlreadyAbsent => return None,
        },
        SyncEvent::Finished(report) => format!(
            "sync finished: {} created, {} replaced, {} removed; SiYuan will reindex shortly",
            report.reconcile.created, report.reconcile.replaced, report.reconcile.removed
        ),
        SyncEvent::Failed { .. } => return None,
        SyncEvent::Reset => "sync history cleared; next sync imports everything".to_string(),
    };
    Some(text)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinox_sync::sync::Checkpoint;

    #[test]
    fn parse_cli_mode_defaults_to_sync() {
        let mode = parse_cli_mode(vec!["dinox-sync".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Sync);
    }

    #[test]
    fn parse_cli_mode_supports_reset() {
        let mode = parse_cli_mode(vec!["dinox-sync".to_string(), "--reset".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Reset);
    }

    #[test]
    fn parse_cli_mode_supports_help() {
        let mode = parse_cli_mode(vec!["dinox-sync".to_string(), "-h".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Help);
    }

    #[test]
    fn parse_cli_mode_rejects_unknown_flags() {
        assert!(parse_cli_mode(vec!["dinox-sync".to_string(), "--force".to_string()]).is_err());
    }

    #[test]
    fn failed_run_is_reported_once_by_the_returned_error() {
        let event = SyncEvent::Failed {
            reason: "sync fetch failed".to_string(),
        };
        assert_eq!(notification(&event), None);
    }

    #[test]
    fn first_sync_warns_against_concurrent_runs() {
        let event = SyncEvent::Started {
            since: Checkpoint::SENTINEL,
        };
        let text = notification(&event).unwrap();
        assert!(text.starts_with("full import started"));
    }

    #[test]
    fn skipped_notes_are_not_announced() {
        let event = SyncEvent::NoteApplied {
            path: "/2024-01-01/X".to_string(),
            action: Action::Skipped,
        };
        assert_eq!(notification(&event), None);
    }
}
