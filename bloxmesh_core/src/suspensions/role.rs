use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, SuspendedRole},
    roblox::id::{GroupId, RoleId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

#[derive(Debug)]
pub enum SetSuspendedRoleError {
    InvalidGroup,
    InvalidRole,
    Generic(CoreError),
}

/// Sets the role given to suspended members. The role must exist in the group.
///
/// # Errors
///
/// See [`SetSuspendedRoleError`] for details.
pub async fn set_suspended_role(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    role_id: RoleId,
) -> Result<AutomationDocument, SetSuspendedRoleError> {
    let Some(roles) = roblox
        .get_group_roles(group_id)
        .await
        .map_err(CoreError::from)?
    else {
        return Err(SetSuspendedRoleError::InvalidGroup);
    };
    let Some(role) = roles.into_iter().find(|r| r.id == role_id) else {
        return Err(SetSuspendedRoleError::InvalidRole);
    };

    let value = format!("{} ({})", role.name, role.id);
    let (document, changed) = automation::apply(
        database,
        group_id,
        AutomationCommand::SetSuspendedRole(Some(SuspendedRole {
            role_id: role.id,
            role_name: role.name,
        })),
    )
    .await?;

    if changed {
        emit(audit, setting_log(group_id, actor, value)).await;
    }
    Ok(document)
}

/// Removes the suspended role. Suspending is refused until a new one is set;
/// existing suspensions still expire normally.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn clear_suspended_role(
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
) -> Result<AutomationDocument, CoreError> {
    let (document, changed) =
        automation::apply(database, group_id, AutomationCommand::SetSuspendedRole(None)).await?;
    if changed {
        emit(audit, setting_log(group_id, actor, "None".into())).await;
    }
    Ok(document)
}

fn setting_log(group_id: GroupId, actor: Option<&str>, value: String) -> AuditLog {
    AuditLog {
        kind: AuditLogKind::SettingModify,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::SettingModify {
            setting: "Suspended Role".into(),
            value,
        },
    }
}

impl From<CoreError> for SetSuspendedRoleError {
    fn from(err: CoreError) -> Self {
        SetSuspendedRoleError::Generic(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_database, FakeRoblox, RecordingAuditor, GROUP, SUSPENDED};

    #[tokio::test]
    async fn set_then_clear() {
        let (database, _) = memory_database();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let document = set_suspended_role(&roblox, &database, &audit, GROUP, None, SUSPENDED)
            .await
            .unwrap();
        assert_eq!(
            document.suspended_role,
            Some(SuspendedRole {
                role_id: SUSPENDED,
                role_name: "Suspended".into()
            })
        );

        let document = clear_suspended_role(&database, &audit, GROUP, None).await.unwrap();
        assert!(document.suspended_role.is_none());
        assert_eq!(
            audit.kinds(),
            vec![AuditLogKind::SettingModify, AuditLogKind::SettingModify]
        );
    }

    #[tokio::test]
    async fn role_outside_the_group_is_rejected() {
        let (database, store) = memory_database();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let res = set_suspended_role(&roblox, &database, &audit, GROUP, None, RoleId(31337)).await;
        assert!(matches!(res, Err(SetSuspendedRoleError::InvalidRole)));
        assert_eq!(store.writes(), 0);
    }
}
