use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, Suspension},
    roblox::id::{GroupId, UserId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

#[derive(Debug)]
pub struct Unsuspend {
    pub document: AutomationDocument,
    /// The suspension that was lifted, `None` if the member was not suspended.
    pub released: Option<Suspension>,
    /// Whether the previous role was given back.
    pub restored: bool,
}

/// Lifts a member's suspension. The record is removed first; the previous role
/// is then restored. A failed restore is logged and reported through
/// [`Unsuspend::restored`] since the record is already gone.
///
/// # Errors
///
/// See [`CoreError`] for details.
#[tracing::instrument(skip_all, fields(group_id = %group_id, user_id = %user_id))]
pub async fn unsuspend(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    user_id: UserId,
) -> Result<Unsuspend, CoreError> {
    let (document, released) = automation::update(database, group_id, |document| {
        let existing = document.active_suspension(user_id).cloned();
        document.apply(AutomationCommand::Unsuspend { user_id })?;
        Ok(existing)
    })
    .await?;

    let Some(suspension) = released else {
        return Ok(Unsuspend {
            document,
            released: None,
            restored: false,
        });
    };

    let restored = match roblox
        .set_role(group_id, user_id, suspension.previous_role_id)
        .await
    {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(err = %err, role_id = %suspension.previous_role_id, "failed to restore the previous role");
            false
        }
    };

    let log = AuditLog {
        kind: AuditLogKind::Unsuspend,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::Unsuspend {
            target_roblox_user: user_id,
            username: suspension.username.clone(),
            restored_role: suspension.previous_role_id,
            restored,
        },
    };
    emit(audit, log).await;

    Ok(Unsuspend {
        document,
        released: Some(suspension),
        restored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        suspensions::{suspend, SuspendArguments},
        test_utils::{memory_database, FakeRoblox, RecordingAuditor, GROUP, OFFICER, SUSPENDED},
    };
    use bloxmesh_models::automation::SuspendedRole;

    async fn setup() -> (Database, FakeRoblox) {
        let (database, _) = memory_database();
        automation::apply(
            &database,
            GROUP,
            AutomationCommand::SetSuspendedRole(Some(SuspendedRole {
                role_id: SUSPENDED,
                role_name: "Suspended".into(),
            })),
        )
        .await
        .unwrap();
        let roblox = FakeRoblox::new().with_member(GROUP, UserId(1), OFFICER);
        (database, roblox)
    }

    fn args() -> SuspendArguments {
        SuspendArguments {
            user_id: UserId(1),
            username: "one".into(),
            previous_role_id: OFFICER,
            previous_role_name: "Officer".into(),
            duration_ms: 60_000,
        }
    }

    #[tokio::test]
    async fn suspend_then_unsuspend_round_trips() {
        let (database, roblox) = setup().await;
        let audit = RecordingAuditor::default();
        let before = automation::load(&database, GROUP).await.unwrap();

        suspend(&roblox, &database, &audit, GROUP, None, args()).await.unwrap();
        let res = unsuspend(&roblox, &database, &audit, GROUP, None, UserId(1))
            .await
            .unwrap();

        assert!(res.restored);
        assert_eq!(res.document, before);
        assert_eq!(roblox.role_of(GROUP, UserId(1)), Some(OFFICER));
        assert_eq!(
            roblox.calls(),
            vec![(GROUP, UserId(1), SUSPENDED), (GROUP, UserId(1), OFFICER)]
        );
    }

    #[tokio::test]
    async fn unsuspending_a_free_member_does_nothing() {
        let (database, roblox) = setup().await;
        let audit = RecordingAuditor::default();

        let res = unsuspend(&roblox, &database, &audit, GROUP, None, UserId(1))
            .await
            .unwrap();
        assert!(res.released.is_none());
        assert!(roblox.calls().is_empty());
        assert!(audit.kinds().is_empty());
    }

    #[tokio::test]
    async fn failed_restore_still_clears_the_record() {
        let (database, roblox) = setup().await;
        let audit = RecordingAuditor::default();
        suspend(&roblox, &database, &audit, GROUP, None, args()).await.unwrap();
        roblox.fail_for(UserId(1));

        let res = unsuspend(&roblox, &database, &audit, GROUP, None, UserId(1))
            .await
            .unwrap();
        assert!(!res.restored);
        assert!(res.released.is_some());
        assert!(res.document.suspensions.is_empty());
    }
}
