use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, Rule},
    roblox::id::{GroupId, RoleId},
};
use bloxmesh_roblox::GroupMembership;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

#[derive(Debug)]
pub struct AddRule {
    pub rule: Rule,
    pub document: AutomationDocument,
}

#[derive(Debug)]
pub enum AddRuleError {
    InvalidGroup,
    InvalidRole,
    Generic(CoreError),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RuleArguments {
    pub points: u64,
    pub role_id: RoleId,
    /// Rules of a sub-group when set, global rules otherwise.
    pub sub_group_id: Option<String>,
}

/// Adds a promotion rule. A rule with the same threshold in the same scope is
/// replaced. The role is validated against the group's roles and its current
/// name is stored with the rule.
///
/// # Errors
///
/// See [`AddRuleError`] for details.
pub async fn add_rule(
    roblox: &dyn GroupMembership,
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    args: RuleArguments,
) -> Result<AddRule, AddRuleError> {
    let Some(roles) = roblox
        .get_group_roles(group_id)
        .await
        .map_err(CoreError::from)?
    else {
        return Err(AddRuleError::InvalidGroup);
    };

    let Some(role) = roles.iter().find(|r| r.id == args.role_id) else {
        return Err(AddRuleError::InvalidRole);
    };

    let rule = Rule {
        id: Uuid::new_v4().to_string(),
        points: args.points,
        role_id: role.id,
        role_name: role.name.clone(),
    };

    let command = match &args.sub_group_id {
        Some(sub_group_id) => AutomationCommand::AddSubGroupRule {
            sub_group_id: sub_group_id.clone(),
            rule: rule.clone(),
        },
        None => AutomationCommand::AddRule(rule.clone()),
    };
    let (document, _) = automation::apply(database, group_id, command).await?;

    let log = AuditLog {
        kind: AuditLogKind::RuleCreate,
        group_id,
        actor: actor.map(ToString::to_string),
        timestamp: Utc::now(),
        metadata: AuditLogData::Rule {
            id: rule.id.clone(),
            points: rule.points,
            role_id: rule.role_id,
            sub_group_id: args.sub_group_id,
        },
    };
    emit(audit, log).await;

    Ok(AddRule { rule, document })
}

impl From<CoreError> for AddRuleError {
    fn from(err: CoreError) -> Self {
        AddRuleError::Generic(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        test_utils::{memory_database, FakeRoblox, RecordingAuditor, GROUP, MEMBER, OFFICER},
    };

    fn args(points: u64, role_id: RoleId, sub_group_id: Option<&str>) -> RuleArguments {
        RuleArguments {
            points,
            role_id,
            sub_group_id: sub_group_id.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn rule_takes_the_role_name_from_roblox() {
        let (database, _) = memory_database();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let added = add_rule(&roblox, &database, &audit, GROUP, None, args(10, MEMBER, None))
            .await
            .unwrap();
        assert_eq!(added.rule.role_name, "Member");
        assert_eq!(added.document.rules, vec![added.rule.clone()]);

        let replaced = add_rule(&roblox, &database, &audit, GROUP, None, args(10, OFFICER, None))
            .await
            .unwrap();
        assert_eq!(replaced.document.rules.len(), 1);
        assert_eq!(replaced.document.rules[0].role_id, OFFICER);
    }

    #[tokio::test]
    async fn unknown_role_or_group_is_rejected() {
        let (database, store) = memory_database();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let res = add_rule(&roblox, &database, &audit, GROUP, None, args(10, RoleId(4242), None)).await;
        assert!(matches!(res, Err(AddRuleError::InvalidRole)));
        let res = add_rule(&roblox, &database, &audit, GroupId(1), None, args(10, MEMBER, None)).await;
        assert!(matches!(res, Err(AddRuleError::InvalidGroup)));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn sub_group_rule_needs_an_existing_sub_group() {
        let (database, _) = memory_database();
        let roblox = FakeRoblox::new();
        let audit = RecordingAuditor::default();

        let res = add_rule(&roblox, &database, &audit, GROUP, None, args(5, MEMBER, Some("medics"))).await;
        match res {
            Err(AddRuleError::Generic(err)) => assert_eq!(err.kind(), &ErrorKind::NotFound),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
