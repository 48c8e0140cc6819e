use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::api::TrackerApi;
use crate::state::{Delta, ProviderCommand};

/// Runs every command on its own worker so a slow scrape never holds up the
/// status poll. Results come back in completion order, not request order.
pub fn spawn_provider(
    api: Arc<dyn TrackerApi>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let worker_tx = tx.clone();
            let spawned = thread::Builder::new()
                .name("sf6-request".to_string())
                .spawn(move || {
                    let _ = worker_tx.send(run_command(api.as_ref(), cmd));
                });
            if let Err(err) = spawned {
                let _ = tx.send(Delta::Log(format!(
                    "[WARN] Could not start request worker: {err}"
                )));
            }
        }
    })
}

/// One request, one delta.
pub fn run_command(api: &dyn TrackerApi, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchStatus => match api.status() {
            Ok(status) => Delta::SetStatus(status),
            Err(err) => Delta::StatusFailed(err),
        },
        ProviderCommand::Login => Delta::LoginFinished(api.login().map(|reply| reply.message)),
        ProviderCommand::Refresh => Delta::RefreshFinished(api.refresh()),
        ProviderCommand::CollectMatches => Delta::CollectFinished(api.collect_matches()),
        ProviderCommand::FetchMatches { limit } => match api.matches(limit) {
            Ok(matches) => Delta::SetMatches(matches),
            Err(err) => Delta::MatchesFailed(err),
        },
        ProviderCommand::DeleteDatabase => {
            Delta::DeleteFinished(api.delete_database().map(|reply| reply.message))
        }
        ProviderCommand::FetchStatsSummary { limit } => match api.stats_summary(limit) {
            Ok(summary) => Delta::SetStatsSummary { limit, summary },
            Err(error) => Delta::StatsFailed {
                what: "summary",
                error,
            },
        },
        ProviderCommand::FetchMrHistory { limit } => match api.mr_history(limit) {
            Ok(history) => Delta::SetMrHistory(history),
            Err(error) => Delta::StatsFailed {
                what: "MR history",
                error,
            },
        },
        ProviderCommand::FetchOpponents => match api.opponents() {
            Ok(names) => Delta::SetOpponents(names),
            Err(error) => Delta::StatsFailed {
                what: "opponents",
                error,
            },
        },
        ProviderCommand::FetchOpponentRecord { name } => match api.opponent_record(&name) {
            Ok(record) => Delta::SetOpponentRecord(record),
            Err(error) => Delta::StatsFailed {
                what: "opponent record",
                error,
            },
        },
        ProviderCommand::FetchUserCode => match api.user_code() {
            Ok(code) => Delta::SetUserCode(code),
            Err(err) => Delta::Log(format!("[WARN] Failed to load user code: {err}")),
        },
        ProviderCommand::SetUserCode { code } => Delta::UserCodeSaved(api.set_user_code(&code)),
    }
}
