use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument},
    roblox::id::{GroupId, UserId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
    promotion::{apply_promotion, PromotionOutcome},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum PointsChange {
    Delta(i64),
    Set(u64),
}

#[derive(Debug, Deserialize)]
pub struct PointsArguments {
    pub user_id: UserId,
    pub username: String,
    pub change: PointsChange,
    /// Allow the rules to move the member to a lower role.
    pub confirm_demotion: bool,
}

#[derive(Debug)]
pub struct PointsUpdate {
    pub document: AutomationDocument,
    pub points: u64,
    pub promotion: PromotionOutcome,
}

/// Changes a member's points and re-evaluates the promotion rules for them.
/// The points are saved even if the role change that follows fails; the
/// failure is reported in [`PointsUpdate::promotion`].
///
/// # Errors
///
/// See [`CoreError`] for details.
#[tracing::instrument(skip_all, fields(group_id = %group_id, user_id = %args.user_id))]
pub async fn update_points(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    args: PointsArguments,
) -> Result<PointsUpdate, CoreError> {
    let command = match args.change {
        PointsChange::Delta(delta) => AutomationCommand::AdjustPoints {
            user_id: args.user_id,
            username: args.username.clone(),
            delta,
        },
        PointsChange::Set(points) => AutomationCommand::SetPoints {
            user_id: args.user_id,
            username: args.username.clone(),
            points,
        },
    };
    let (document, _) = automation::apply(database, group_id, command).await?;
    let points = document.user_points(args.user_id).map_or(0, |p| p.points);

    let (kind, delta) = match args.change {
        PointsChange::Delta(delta) if delta < 0 => (AuditLogKind::PointsRemove, delta),
        PointsChange::Delta(delta) => (AuditLogKind::PointsAdd, delta),
        PointsChange::Set(_) => (AuditLogKind::PointsSet, 0),
    };
    let log = AuditLog {
        kind,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::Points {
            target_roblox_user: args.user_id,
            username: args.username,
            delta,
            total: points,
        },
    };
    emit(audit, log).await;

    let promotion = match apply_promotion(
        roblox,
        audit,
        &document,
        group_id,
        args.user_id,
        actor,
        args.confirm_demotion,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(err = %err, "points saved but the promotion failed");
            PromotionOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };

    Ok(PointsUpdate {
        document,
        points,
        promotion,
    })
}
