use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument},
    roblox::id::{GroupId, UserId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

/// Removes a member from the group. Their suspension, if any, is dropped since
/// there is no role left to restore. Points are kept in case they rejoin.
///
/// # Errors
///
/// See [`CoreError`] for details.
#[tracing::instrument(skip_all, fields(group_id = %group_id, user_id = %user_id))]
pub async fn kick_member(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    user_id: UserId,
) -> Result<AutomationDocument, CoreError> {
    roblox.remove_member(group_id, user_id).await?;

    let (document, _) =
        automation::apply(database, group_id, AutomationCommand::Unsuspend { user_id }).await?;

    let log = AuditLog {
        kind: AuditLogKind::Kick,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::Kick {
            target_roblox_user: user_id,
        },
    };
    emit(audit, log).await;
    Ok(document)
}
