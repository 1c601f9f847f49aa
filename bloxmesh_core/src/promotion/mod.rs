mod evaluate;

use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::AutomationDocument,
    roblox::{
        group::GroupRole,
        id::{GroupId, RoleId, UserId},
    },
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;
use serde::Serialize;

pub use evaluate::evaluate;

use crate::{
    audit::{emit, AuditSink},
    error::CoreError,
};

/// What happened to a member's role after their points changed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PromotionOutcome {
    /// Suspended members are exempt from automation.
    Suspended,
    NoRule,
    NotInGroup,
    Unchanged {
        role_id: RoleId,
    },
    Promoted {
        from: RoleId,
        to: RoleId,
        role_name: String,
    },
    Demoted {
        from: RoleId,
        to: RoleId,
        role_name: String,
    },
    /// The rules call for a lower role, which needs an explicit confirmation.
    DemotionPending {
        from: RoleId,
        to: RoleId,
        role_name: String,
    },
    /// Points were saved but the role could not be changed.
    Failed {
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Promotion,
    Demotion,
}

/// Whether moving from `current` to `target` lowers the member's rank. A
/// target missing from `roles` is treated as a promotion.
#[must_use]
pub fn direction(current: &GroupRole, target: RoleId, roles: &[GroupRole]) -> Direction {
    match roles.iter().find(|r| r.id == target) {
        Some(target) if target.rank < current.rank => Direction::Demotion,
        _ => Direction::Promotion,
    }
}

/// Brings the member's live role in line with the rules of `document`.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn apply_promotion(
    roblox: &dyn GroupMembership,
    audit: &dyn AuditSink,
    document: &AutomationDocument,
    group_id: GroupId,
    user_id: UserId,
    actor: Option<&str>,
    confirm_demotion: bool,
) -> Result<PromotionOutcome, CoreError> {
    if document.active_suspension(user_id).is_some() {
        return Ok(PromotionOutcome::Suspended);
    }

    let points = document.user_points(user_id).map_or(0, |p| p.points);
    let Some(rule) = evaluate(points, document.member_sub_group(user_id), &document.rules) else {
        return Ok(PromotionOutcome::NoRule);
    };

    let Some(current) = roblox.get_user_role(group_id, user_id).await? else {
        return Ok(PromotionOutcome::NotInGroup);
    };
    if current.id == rule.role_id {
        return Ok(PromotionOutcome::Unchanged {
            role_id: current.id,
        });
    }

    let roles = roblox.get_group_roles(group_id).await?.unwrap_or_default();
    let direction = direction(&current, rule.role_id, &roles);
    if direction == Direction::Demotion && !confirm_demotion {
        return Ok(PromotionOutcome::DemotionPending {
            from: current.id,
            to: rule.role_id,
            role_name: rule.role_name.clone(),
        });
    }

    roblox.set_role(group_id, user_id, rule.role_id).await?;
    tracing::info!(%group_id, %user_id, from = %current.id, to = %rule.role_id, ?direction, "rank changed by automation");

    let log = AuditLog {
        kind: AuditLogKind::SetRank,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::SetRank {
            target_roblox_user: user_id,
            from: Some(current.id),
            to: rule.role_id,
            role_name: rule.role_name.clone(),
        },
    };
    emit(audit, log).await;

    Ok(match direction {
        Direction::Promotion => PromotionOutcome::Promoted {
            from: current.id,
            to: rule.role_id,
            role_name: rule.role_name.clone(),
        },
        Direction::Demotion => PromotionOutcome::Demoted {
            from: current.id,
            to: rule.role_id,
            role_name: rule.role_name.clone(),
        },
    })
}
