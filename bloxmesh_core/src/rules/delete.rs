use bloxmesh_database::Database;
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogData, AuditLogKind},
    automation::{AutomationCommand, AutomationDocument, Rule},
    roblox::id::GroupId,
};
use chrono::Utc;

use crate::{
    audit::{emit, AuditSink},
    automation,
    error::CoreError,
};

#[derive(Debug)]
pub struct DeleteRule {
    pub deleted: Option<Rule>,
    pub document: AutomationDocument,
}

/// Deletes a global or sub-group rule. A rule that no longer exists is not an
/// error; [`DeleteRule::deleted`] is `None` then.
///
/// # Errors
///
/// See [`CoreError`] for details.
pub async fn delete_rule(
    database: &Database,
    audit: &dyn AuditSink,
    group_id: GroupId,
    actor: Option<&str>,
    rule_id: String,
    sub_group_id: Option<String>,
) -> Result<DeleteRule, CoreError> {
    let (document, deleted) = automation::update(database, group_id, |document| {
        let rules = match &sub_group_id {
            Some(id) => document.sub_group(id).map(|s| s.rules.as_slice()).unwrap_or_default(),
            None => document.rules.as_slice(),
        };
        let existing = rules.iter().find(|r| r.id == rule_id).cloned();

        let command = match &sub_group_id {
            Some(id) => AutomationCommand::DeleteSubGroupRule {
                sub_group_id: id.clone(),
                rule_id: rule_id.clone(),
            },
            None => AutomationCommand::DeleteRule {
                rule_id: rule_id.clone(),
            },
        };
        document.apply(command)?;
        Ok(existing)
    })
    .await?;

    if let Some(rule) = &deleted {
        let log = AuditLog {
            kind: AuditLogKind::RuleDelete,
            group_id,
            actor: actor.map(ToString::to_string),
            timestamp: Utc::now(),
            metadata: AuditLogData::Rule {
                id: rule.id.clone(),
                points: rule.points,
                role_id: rule.role_id,
                sub_group_id,
            },
        };
        emit(audit, log).await;
    }

    Ok(DeleteRule { deleted, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_database, RecordingAuditor, GROUP, MEMBER};

    #[tokio::test]
    async fn deletes_once_then_no_ops() {
        let (database, store) = memory_database();
        let audit = RecordingAuditor::default();
        automation::apply(
            &database,
            GROUP,
            AutomationCommand::AddRule(Rule {
                id: "r1".into(),
                points: 10,
                role_id: MEMBER,
                role_name: "Member".into(),
            }),
        )
        .await
        .unwrap();

        let res = delete_rule(&database, &audit, GROUP, None, "r1".into(), None)
            .await
            .unwrap();
        assert_eq!(res.deleted.map(|r| r.id), Some("r1".to_string()));
        assert!(res.document.rules.is_empty());
        let writes = store.writes();

        let res = delete_rule(&database, &audit, GROUP, None, "r1".into(), None)
            .await
            .unwrap();
        assert!(res.deleted.is_none());
        assert_eq!(store.writes(), writes);
        assert_eq!(audit.kinds(), vec![AuditLogKind::RuleDelete]);
    }

    #[tokio::test]
    async fn rule_of_missing_sub_group_is_a_no_op() {
        let (database, _) = memory_database();
        let audit = RecordingAuditor::default();
        let res = delete_rule(&database, &audit, GROUP, None, "r1".into(), Some("gone".into()))
            .await
            .unwrap();
        assert!(res.deleted.is_none());
    }
}
