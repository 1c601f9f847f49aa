use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, SubGroup},
    roblox::id::{GroupId, UserId},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

const DEFAULT_COLOR: &str = "#95A5A6";

#[derive(Debug, Deserialize)]
pub struct SubGroupArguments {
    pub name: String,
    pub color: Option<String>,
    #[serde(default)]
    pub exclude_from_general_automation: bool,
}

fn log(group_id: GroupId, actor: Option<&str>, kind: AuditLogKind, id: String, name: String) -> AuditLog {
    AuditLog {
        kind,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::SubGroup { id, name },
    }
}

/// Creates an empty sub-group.
///
/// # Errors
///
/// Returns a config error for a blank name, otherwise see [`CoreError`].
pub async fn create_sub_group(
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    args: SubGroupArguments,
) -> Result<(AutomationDocument, SubGroup), CoreError> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CoreError::config("a sub-group needs a name"));
    }

    let sub_group = SubGroup {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        color: args.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        rules: Vec::new(),
        exclude_from_general_automation: args.exclude_from_general_automation,
    };
    let (document, _) = automation::apply(
        database,
        group_id,
        AutomationCommand::CreateSubGroup(sub_group.clone()),
    )
    .await?;

    emit(
        audit,
        log(group_id, actor, AuditLogKind::SubGroupCreate, sub_group.id.clone(), sub_group.name.clone()),
    )
    .await;
    Ok((document, sub_group))
}

/// Deletes a sub-group along with its rules. Members that referenced it fall
/// back to the global rules.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn delete_sub_group(
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    sub_group_id: String,
) -> Result<(AutomationDocument, Option<SubGroup>), CoreError> {
    let (document, deleted) = automation::update(database, group_id, |document| {
        let existing = document.sub_group(&sub_group_id).cloned();
        document.apply(AutomationCommand::DeleteSubGroup {
            sub_group_id: sub_group_id.clone(),
        })?;
        Ok(existing)
    })
    .await?;

    if let Some(sub_group) = &deleted {
        emit(
            audit,
            log(group_id, actor, AuditLogKind::SubGroupDelete, sub_group.id.clone(), sub_group.name.clone()),
        )
        .await;
    }
    Ok((document, deleted))
}

/// Moves a member into a sub-group, or out of any with `None`.
///
/// # Errors
///
/// Returns a not found error if the sub-group does not exist, otherwise see
/// [`CoreError`].
pub async fn assign_sub_group(
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    user_id: UserId,
    username: String,
    sub_group_id: Option<String>,
) -> Result<AutomationDocument, CoreError> {
    let (document, changed) = automation::apply(
        database,
        group_id,
        AutomationCommand::AssignSubGroup {
            user_id,
            username,
            sub_group_id: sub_group_id.clone(),
        },
    )
    .await?;
    if !changed {
        return Ok(document);
    }

    let (id, name) = match sub_group_id.as_deref().and_then(|id| document.sub_group(id)) {
        Some(sub_group) => (sub_group.id.clone(), sub_group.name.clone()),
        None => (String::new(), format!("user {user_id} removed from sub-group")),
    };
    emit(audit, log(group_id, actor, AuditLogKind::SubGroupModify, id, name)).await;
    Ok(document)
}
