use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, Suspension},
    roblox::id::{GroupId, RoleId, UserId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::{Duration, Timelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

#[derive(Debug, Deserialize)]
pub struct SuspendArguments {
    pub user_id: UserId,
    pub username: String,
    pub previous_role_id: RoleId,
    pub previous_role_name: String,
    pub duration_ms: u64,
}

#[derive(Debug)]
pub struct Suspend {
    pub suspension: Suspension,
    pub document: AutomationDocument,
}

/// Suspends a member: the suspension is recorded first, replacing any earlier
/// one for the member, then the group's suspended role is applied. If Roblox
/// refuses the role change the record is rolled back and the earlier
/// suspension, if any, is put back.
///
/// # Errors
///
/// Returns a config error when the group has no suspended role or the duration
/// is not positive. Roblox and database errors are passed through.
#[tracing::instrument(skip_all, fields(group_id = %group_id, user_id = %args.user_id))]
pub async fn suspend(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    args: SuspendArguments,
) -> Result<Suspend, CoreError> {
    let duration = i64::try_from(args.duration_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .filter(|d| *d > Duration::zero())
        .ok_or_else(|| CoreError::config("the suspension duration must be positive"))?;

    // stored with millisecond precision
    let now = Utc::now();
    let suspended_at = now
        .with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now);
    let expires_at = suspended_at
        .checked_add_signed(duration)
        .ok_or_else(|| CoreError::config("the suspension would end past the supported date range"))?;
    let suspension = Suspension {
        id: Uuid::new_v4().to_string(),
        user_id: args.user_id,
        username: args.username,
        previous_role_id: args.previous_role_id,
        previous_role_name: args.previous_role_name,
        suspended_at,
        expires_at,
    };

    let (document, (suspended_role, prior)) = automation::update(database, group_id, |document| {
        let role = document
            .suspended_role
            .clone()
            .ok_or_else(|| CoreError::config("this group has no suspended role"))?;
        let prior = document.active_suspension(suspension.user_id).cloned();
        document.apply(AutomationCommand::Suspend(suspension.clone()))?;
        Ok((role, prior))
    })
    .await?;

    if let Err(err) = roblox
        .set_role(group_id, suspension.user_id, suspended_role.role_id)
        .await
    {
        tracing::warn!(err = %err, "suspended role was refused, rolling back the suspension");
        rollback(database, group_id, &suspension, prior).await;
        return Err(err.into());
    }

    tracing::info!(expires_at = %suspension.expires_at, "member suspended");
    let log = AuditLog {
        kind: AuditLogKind::Suspend,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: suspended_at,
        metadata: AuditLogData::Suspend {
            target_roblox_user: suspension.user_id,
            username: suspension.username.clone(),
            previous_role: suspension.previous_role_id,
            expires_at: suspension.expires_at,
        },
    };
    emit(audit, log).await;

    Ok(Suspend {
        suspension,
        document,
    })
}

async fn rollback(
    database: &Database,
    group_id: GroupId,
    suspension: &Suspension,
    prior: Option<Suspension>,
) {
    let res = automation::update(database, group_id, |document| {
        document.apply(AutomationCommand::RemoveSuspensions {
            ids: vec![suspension.id.clone()],
        })?;
        if let Some(prior) = prior {
            if document.active_suspension(prior.user_id).is_none() {
                document.apply(AutomationCommand::Suspend(prior))?;
            }
        }
        Ok(())
    })
    .await;
    if let Err(err) = res {
        tracing::error!(err = %err, suspension = %suspension.id, "failed to roll back suspension");
    }
}
