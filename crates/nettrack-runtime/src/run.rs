//! Wires the monitor, the CSV log and the publisher together and runs until
//! ctrl-c or SIGTERM.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use nettrack_core::{Monitor, Probe, SystemClock};
use nettrack_probe::{NmapExecutor, NmapProbe};
use nettrack_sink::{CsvEventLog, GitPublisher, SinkAdapter, SinkStats, log_file_name};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::publish_worker::{self, WorkerReport};
use crate::sleeper::CancellableSleeper;

/// How long shutdown waits for an in-flight publish.
const PUBLISH_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct RunSummary {
    pub log_path: PathBuf,
    pub events: usize,
    pub sink: SinkStats,
    /// `None` when publishing was disabled or the worker did not finish.
    pub publish: Option<WorkerReport>,
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let probe = NmapProbe::new(
        NmapExecutor::new(settings.nmap_bin.clone()),
        settings.subnet.clone(),
    );
    let summary = run_with(&settings, probe, shutdown_signal()).await?;
    tracing::info!(
        events = summary.events,
        append_failures = summary.sink.append_failures,
        publish = ?summary.publish,
        log = %summary.log_path.display(),
        "monitor stopped"
    );
    Ok(())
}

/// Run the monitor with `probe` until `shutdown` resolves.
pub async fn run_with<P, F>(settings: &Settings, probe: P, shutdown: F) -> anyhow::Result<RunSummary>
where
    P: Probe + Send + 'static,
    F: Future<Output = ()>,
{
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;
    let file_name = log_file_name(&settings.alias, Local::now().naive_local());
    let log_path = settings.output_dir.join(&file_name);
    let log = CsvEventLog::create(&log_path)
        .with_context(|| format!("failed to create event log {}", log_path.display()))?;

    let (publisher, worker) = match settings.publish {
        Some(ref publish) => {
            let git = GitPublisher::in_repo(&settings.output_dir, file_name.clone())
                .with_remote(publish.remote.clone())
                .with_branch(publish.branch.clone());
            let (queue, handle) = publish_worker::spawn(git);
            (Some(queue), Some(handle))
        }
        None => (None, None),
    };

    let cancel = CancellationToken::new();
    let sleeper = CancellableSleeper::new(Handle::current(), cancel.clone());
    let monitor = Monitor::new(
        settings.device.clone(),
        settings.debounce.clone(),
        probe,
        SystemClock,
        sleeper,
    )?;

    tracing::info!(
        device = %settings.device,
        alias = %settings.alias,
        log = %log_path.display(),
        poll_secs = settings.debounce.poll_interval.as_secs(),
        confirmation_window_secs = settings.debounce.confirmation_window().as_secs(),
        publish = settings.publish.is_some(),
        "monitoring started"
    );

    // The sink (and with it the queue sender) lives on the monitor thread, so
    // the publish worker sees its channel close once the monitor returns.
    let mut monitor_task = tokio::task::spawn_blocking(move || {
        let mut sink = SinkAdapter::new(log, publisher);
        let events = monitor.run_into(&mut sink);
        (events, sink.stats())
    });

    let finished_early = tokio::select! {
        () = shutdown => None,
        joined = &mut monitor_task => Some(joined),
    };
    let joined = match finished_early {
        Some(joined) => {
            tracing::warn!("monitor exited without a shutdown request");
            joined
        }
        None => {
            cancel.cancel();
            monitor_task.await
        }
    };
    let (events, sink) = joined.context("monitor thread panicked")?;

    let publish = match worker {
        Some(handle) => match tokio::time::timeout(PUBLISH_DRAIN_TIMEOUT, handle).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::error!("publish worker failed: {e}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = PUBLISH_DRAIN_TIMEOUT.as_secs(),
                    "publish still running at shutdown, not waiting for it"
                );
                None
            }
        },
        None => None,
    };

    Ok(RunSummary {
        log_path,
        events,
        sink,
        publish,
    })
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use nettrack_core::{DebounceConfig, EventKind};
    use nettrack_sink::HEADER;

    struct Fixed(bool);

    impl Probe for Fixed {
        type Error = Infallible;

        fn probe(&mut self, _device: &str) -> Result<bool, Infallible> {
            Ok(self.0)
        }
    }

    fn settings(output_dir: PathBuf) -> Settings {
        Settings {
            device: "android-9b72272b83db0551".to_string(),
            alias: "phone".to_string(),
            debounce: DebounceConfig::default().with_poll_interval(Duration::from_secs(3600)),
            subnet: "192.168.0.0/24".to_string(),
            nmap_bin: "nmap".to_string(),
            output_dir,
            publish: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writes_initial_event_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings(dir.path().join("logs").join("nested"));

        let summary = tokio::time::timeout(
            Duration::from_secs(10),
            run_with(
                &settings,
                Fixed(true),
                tokio::time::sleep(Duration::from_millis(50)),
            ),
        )
        .await
        .expect("shutdown interrupts the poll sleep")
        .expect("run");

        assert_eq!(summary.events, 1);
        assert_eq!(summary.sink.appended, 1);
        assert!(summary.publish.is_none());

        let file_name = summary
            .log_path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(file_name.starts_with("phone_"));
        assert!(file_name.ends_with(".csv"));

        let content = std::fs::read_to_string(&summary.log_path).expect("read log");
        assert_eq!(content.lines().next(), Some(HEADER));
        let records = CsvEventLog::read_records(&summary.log_path).expect("read records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, EventKind::CurrentlyConnected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unwritable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("write");

        let err = run_with(&settings(blocker), Fixed(false), std::future::pending())
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("output directory"));
    }
}
