use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, AUTOMATION_COLLECTION},
    roblox::id::GroupId,
};
use bloxmesh_roblox::GroupMembership;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::AddAssign;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

/// What to do with an expired suspension whose previous role could not be
/// restored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Remove the record anyway.
    #[default]
    Drop,
    /// Keep the record so the next sweep tries again.
    Retain,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SweepReport {
    /// Expired suspensions that were handled, restored or not.
    pub processed: usize,
    pub restored: usize,
    pub errors: usize,
    /// Another sweep was already running so this one did nothing.
    pub skipped: bool,
}

impl SweepReport {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

impl AddAssign for SweepReport {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.restored += rhs.restored;
        self.errors += rhs.errors;
        self.skipped |= rhs.skipped;
    }
}

/// Restores the expired suspensions of one document. A document without expired
/// suspensions costs no Roblox calls and no writes.
///
/// Only the suspensions that were processed are removed afterwards, under the
/// group's lock, so a suspension added while the roles were being restored
/// survives.
///
/// # Errors
///
/// Returns Err if the document could not be written back. Roblox failures are
/// counted in the report instead.
pub async fn sweep_document(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    document: &AutomationDocument,
    now: DateTime<Utc>,
    policy: FailurePolicy,
) -> Result<SweepReport, CoreError> {
    let expired = document.expired_suspensions(now);
    if expired.is_empty() {
        return Ok(SweepReport::default());
    }

    let mut report = SweepReport::default();
    let mut finished = Vec::with_capacity(expired.len());
    for suspension in expired {
        report.processed += 1;
        match roblox
            .set_role(group_id, suspension.user_id, suspension.previous_role_id)
            .await
        {
            Ok(()) => {
                report.restored += 1;
                let log = AuditLog {
                    kind: AuditLogKind::SuspensionExpired,
                    group_id,
                    actor: None,
                    timestamp: now,
                    metadata: AuditLogData::Unsuspend {
                        target_roblox_user: suspension.user_id,
                        username: suspension.username.clone(),
                        restored_role: suspension.previous_role_id,
                        restored: true,
                    },
                };
                emit(audit, log).await;
                finished.push(suspension.id);
            }
            Err(err) => {
                report.errors += 1;
                tracing::warn!(
                    err = %err,
                    %group_id,
                    user_id = %suspension.user_id,
                    ?policy,
                    "failed to restore an expired suspension"
                );
                if policy == FailurePolicy::Drop {
                    finished.push(suspension.id);
                }
            }
        }
    }

    if !finished.is_empty() {
        automation::apply(
            database,
            group_id,
            AutomationCommand::RemoveSuspensions { ids: finished },
        )
        .await?;
    }
    Ok(report)
}

/// Sweeps a single group, used by the dashboard's manual cleanup.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn sweep_group(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    now: DateTime<Utc>,
    policy: FailurePolicy,
) -> Result<(AutomationDocument, SweepReport), CoreError> {
    let document = automation::load(database, group_id).await?;
    let report = sweep_document(roblox, database, audit, group_id, &document, now, policy).await?;
    let document = if report.processed > 0 {
        automation::load(database, group_id).await?
    } else {
        document
    };
    Ok((document, report))
}

/// Sweeps every group. A group that fails, whether its document is malformed or
/// cannot be written, is logged and counted without stopping the others.
///
/// # Errors
///
/// Returns Err only if the documents could not be listed.
pub async fn sweep_all(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    now: DateTime<Utc>,
    policy: FailurePolicy,
) -> Result<SweepReport, CoreError> {
    let documents = database
        .list::<AutomationDocument>(AUTOMATION_COLLECTION)
        .await?;

    let mut report = SweepReport::default();
    for (id, document) in documents {
        let Ok(group_id) = id.parse::<u64>().map(GroupId) else {
            tracing::warn!(id = %id, "skipping automation document with a malformed id");
            report.errors += 1;
            continue;
        };
        let document = match document {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(err = %err, %group_id, "failed to read automation document");
                report.errors += 1;
                continue;
            }
        };
        match sweep_document(roblox, database, audit, group_id, &document, now, policy).await {
            Ok(group_report) => report += group_report,
            Err(err) => {
                tracing::error!(err = %err, %group_id, "failed to sweep group");
                report.errors += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloxmesh_database::DocumentStore;
    use crate::test_utils::{
        memory_database, FakeRoblox, FlakyStore, RecordingAuditor, GROUP, MEMBER, OFFICER,
    };
    use bloxmesh_models::{
        automation::Suspension,
        roblox::id::{RoleId, UserId},
    };
    use chrono::Duration;
    use std::sync::Arc;

    fn suspension(id: &str, user: u64, previous: RoleId, expires_at: DateTime<Utc>) -> Suspension {
        Suspension {
            id: id.into(),
            user_id: UserId(user),
            username: format!("user{user}"),
            previous_role_id: previous,
            previous_role_name: "Previous".into(),
            suspended_at: expires_at - Duration::minutes(1),
            expires_at,
        }
    }

    async fn seed(database: &Database, group_id: GroupId, suspensions: Vec<Suspension>) {
        for s in suspensions {
            automation::apply(database, group_id, AutomationCommand::Suspend(s))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn nothing_expired_means_no_calls_and_no_writes() {
        let (database, store) = memory_database();
        let now = Utc::now();
        seed(&database, GROUP, vec![suspension("a", 1, OFFICER, now + Duration::seconds(1))]).await;
        let writes = store.writes();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let report = sweep_all(&roblox, &database, &audit, now, FailurePolicy::Drop)
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(roblox.calls().is_empty());
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn expiry_is_inclusive() {
        let (database, _) = memory_database();
        let now = Utc::now();
        seed(&database, GROUP, vec![suspension("a", 1, OFFICER, now)]).await;
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let (document, report) = sweep_group(&roblox, &database, &audit, GROUP, now, FailurePolicy::Drop)
            .await
            .unwrap();
        assert_eq!(report.restored, 1);
        assert!(document.suspensions.is_empty());
        assert_eq!(audit.kinds(), vec![AuditLogKind::SuspensionExpired]);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_suspension() {
        let (database, _) = memory_database();
        let now = Utc::now();
        let past = now - Duration::seconds(1);
        seed(
            &database,
            GROUP,
            vec![
                suspension("a", 1, OFFICER, past),
                suspension("b", 2, MEMBER, past),
                suspension("c", 3, MEMBER, now + Duration::hours(1)),
            ],
        )
        .await;
        let roblox = FakeRoblox::new();
        roblox.fail_for(UserId(1));
        let audit = RecordingAuditor::default();

        let report = sweep_all(&roblox, &database, &audit, now, FailurePolicy::Retain)
            .await
            .unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.restored, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(roblox.role_of(GROUP, UserId(2)), Some(MEMBER));

        let document = automation::load(&database, GROUP).await.unwrap();
        let left: Vec<_> = document.suspensions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(left, vec!["a", "c"]);

        // dropped instead of retained
        let report = sweep_all(&roblox, &database, &audit, now, FailurePolicy::Drop)
            .await
            .unwrap();
        assert_eq!(report.processed, 1);
        let document = automation::load(&database, GROUP).await.unwrap();
        assert_eq!(document.suspensions.len(), 1);
        assert_eq!(document.suspensions[0].id, "c");
    }

    #[tokio::test]
    async fn failing_group_does_not_stop_the_others() {
        let store = Arc::new(FlakyStore::new());
        let database = Database::new(store.clone());
        let now = Utc::now();
        let past = now - Duration::seconds(1);
        seed(&database, GroupId(1), vec![suspension("a", 1, OFFICER, past)]).await;
        seed(&database, GroupId(2), vec![suspension("b", 2, OFFICER, past)]).await;
        store.fail_writes_to("1");
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let report = sweep_all(&roblox, &database, &audit, now, FailurePolicy::Drop)
            .await
            .unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.restored, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(roblox.calls().len(), 2);
        assert!(automation::load(&database, GroupId(2))
            .await
            .unwrap()
            .suspensions
            .is_empty());
        assert_eq!(
            automation::load(&database, GroupId(1))
                .await
                .unwrap()
                .suspensions
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn malformed_documents_are_counted() {
        let (database, store) = memory_database();
        store
            .set(AUTOMATION_COLLECTION, "not-a-group", serde_json::json!({}))
            .await
            .unwrap();
        store
            .set(AUTOMATION_COLLECTION, "5", serde_json::json!({"rules": "nope"}))
            .await
            .unwrap();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let report = sweep_all(&roblox, &database, &audit, Utc::now(), FailurePolicy::Drop)
            .await
            .unwrap();
        assert_eq!(report.errors, 2);
    }
}
