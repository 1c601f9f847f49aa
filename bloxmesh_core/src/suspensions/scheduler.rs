use bloxmesh_database::Database;
use bloxmesh_models::{automation::AutomationDocument, roblox::id::GroupId};
use bloxmesh_roblox::GroupMembership;
use chrono::{DateTime, Utc};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};

use super::sweep::{sweep_all, sweep_group, FailurePolicy, SweepReport};
use crate::{audit::AuditSink, automation, error::CoreError};

struct SweeperInner {
    roblox: Arc<dyn GroupMembership>,
    database: Database,
    audit: Arc<dyn AuditSink>,
    policy: FailurePolicy,
    running: AtomicBool,
}

/// Restores expired suspensions across all groups. Runs never overlap: a run
/// requested while another is in flight returns a skipped report.
#[derive(Clone)]
pub struct Sweeper(Arc<SweeperInner>);

pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Sweeper {
    #[must_use]
    pub fn new(
        roblox: Arc<dyn GroupMembership>,
        database: Database,
        audit: Arc<dyn AuditSink>,
        policy: FailurePolicy,
    ) -> Self {
        Self(Arc::new(SweeperInner {
            roblox,
            database,
            audit,
            policy,
            running: AtomicBool::new(false),
        }))
    }

    fn try_start(&self) -> Option<RunningGuard<'_>> {
        if self
            .0
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sweep already in progress");
            return None;
        }
        Some(RunningGuard(&self.0.running))
    }

    /// Runs a single sweep as of `now`.
    ///
    /// # Errors
    ///
    /// Returns Err if the automation documents could not be listed.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<SweepReport, CoreError> {
        let Some(_guard) = self.try_start() else {
            return Ok(SweepReport::skipped());
        };

        let report = sweep_all(
            self.0.roblox.as_ref(),
            &self.0.database,
            self.0.audit.as_ref(),
            now,
            self.0.policy,
        )
        .await?;
        if report.processed > 0 || report.errors > 0 {
            tracing::info!(
                processed = report.processed,
                restored = report.restored,
                errors = report.errors,
                "suspension sweep finished"
            );
        }
        Ok(report)
    }

    /// Sweeps a single group as of `now`. Shares the in-flight guard with
    /// [`Sweeper::run_once`], so a group is never swept twice at once; when
    /// skipped the stored document is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns Err if the document could not be read or written.
    pub async fn run_group(
        &self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> Result<(AutomationDocument, SweepReport), CoreError> {
        let Some(_guard) = self.try_start() else {
            let document = automation::load(&self.0.database, group_id).await?;
            return Ok((document, SweepReport::skipped()));
        };

        sweep_group(
            self.0.roblox.as_ref(),
            &self.0.database,
            self.0.audit.as_ref(),
            group_id,
            now,
            self.0.policy,
        )
        .await
    }

    /// Runs a sweep right away and then again `interval` after each run
    /// finishes, until the returned handle is shut down.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> SweeperHandle {
        let (shutdown, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                if let Err(err) = self.run_once(Utc::now()).await {
                    tracing::error!(err = %err, "suspension sweep failed");
                }
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    _ = rx.changed() => break,
                }
            }
            tracing::info!("suspension sweeper stopped");
        });
        SweeperHandle { shutdown, task }
    }
}

impl SweeperHandle {
    /// Stops the loop and waits for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::error!(err = %err, "suspension sweeper task panicked");
        }
    }
}
