mod points;
mod rule;
mod sub_group;
mod suspension;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

pub use points::UserPoints;
pub use rule::{Rule, SubGroupRule};
pub use sub_group::SubGroup;
pub use suspension::{SuspendedRole, Suspension};

use crate::roblox::id::UserId;

/// Collection holding one [`AutomationDocument`] per group, keyed by group id.
pub const AUTOMATION_COLLECTION: &str = "automation";

/// Everything the automation subsystem believes about one group.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationDocument {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub user_points: Vec<UserPoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_role: Option<SuspendedRole>,
    #[serde(default)]
    pub suspensions: Vec<Suspension>,
    #[serde(default)]
    pub sub_groups: Vec<SubGroup>,
}

/// A single mutation of an [`AutomationDocument`].
#[derive(Clone, Debug)]
pub enum AutomationCommand {
    /// Adds a global rule, replacing any rule with the same threshold.
    AddRule(Rule),
    DeleteRule {
        rule_id: String,
    },
    SetSuspendedRole(Option<SuspendedRole>),
    AdjustPoints {
        user_id: UserId,
        username: String,
        delta: i64,
    },
    SetPoints {
        user_id: UserId,
        username: String,
        points: u64,
    },
    CreateSubGroup(SubGroup),
    /// Removes the sub-group and clears every member reference to it.
    DeleteSubGroup {
        sub_group_id: String,
    },
    AddSubGroupRule {
        sub_group_id: String,
        rule: SubGroupRule,
    },
    DeleteSubGroupRule {
        sub_group_id: String,
        rule_id: String,
    },
    AssignSubGroup {
        user_id: UserId,
        username: String,
        sub_group_id: Option<String>,
    },
    /// Records a suspension, replacing any previous one of the same user.
    Suspend(Suspension),
    Unsuspend {
        user_id: UserId,
    },
    RemoveSuspensions {
        ids: Vec<String>,
    },
}

#[derive(Debug, Eq, PartialEq)]
pub enum DocumentError {
    SubGroupNotFound(String),
    InvalidSuspensionWindow,
}

impl AutomationDocument {
    /// Applies `command` in place. Returns whether the document changed, so
    /// callers can skip the write when nothing happened.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the command references a sub-group that does
    /// not exist or carries a suspension that expires before it starts. The
    /// document is left untouched in that case.
    pub fn apply(&mut self, command: AutomationCommand) -> Result<bool, DocumentError> {
        match command {
            AutomationCommand::AddRule(rule) => {
                upsert_rule(&mut self.rules, rule);
                Ok(true)
            }
            AutomationCommand::DeleteRule { rule_id } => {
                let before = self.rules.len();
                self.rules.retain(|r| r.id != rule_id);
                Ok(self.rules.len() != before)
            }
            AutomationCommand::SetSuspendedRole(role) => {
                let changed = self.suspended_role != role;
                self.suspended_role = role;
                Ok(changed)
            }
            AutomationCommand::AdjustPoints {
                user_id,
                username,
                delta,
            } => {
                let entry = self.user_points_entry(user_id, username);
                entry.adjust(delta);
                self.prune_points();
                Ok(true)
            }
            AutomationCommand::SetPoints {
                user_id,
                username,
                points,
            } => {
                let entry = self.user_points_entry(user_id, username);
                entry.points = points;
                self.prune_points();
                Ok(true)
            }
            AutomationCommand::CreateSubGroup(sub_group) => {
                self.sub_groups.retain(|s| s.id != sub_group.id);
                self.sub_groups.push(sub_group);
                Ok(true)
            }
            AutomationCommand::DeleteSubGroup { sub_group_id } => {
                let before = self.sub_groups.len();
                self.sub_groups.retain(|s| s.id != sub_group_id);
                let mut changed = self.sub_groups.len() != before;
                for entry in &mut self.user_points {
                    if entry.sub_group_id.as_deref() == Some(sub_group_id.as_str()) {
                        entry.sub_group_id = None;
                        changed = true;
                    }
                }
                self.prune_points();
                Ok(changed)
            }
            AutomationCommand::AddSubGroupRule { sub_group_id, rule } => {
                let sub_group = self
                    .sub_groups
                    .iter_mut()
                    .find(|s| s.id == sub_group_id)
                    .ok_or(DocumentError::SubGroupNotFound(sub_group_id))?;
                upsert_rule(&mut sub_group.rules, rule);
                Ok(true)
            }
            AutomationCommand::DeleteSubGroupRule {
                sub_group_id,
                rule_id,
            } => {
                let Some(sub_group) = self.sub_groups.iter_mut().find(|s| s.id == sub_group_id)
                else {
                    return Ok(false);
                };
                let before = sub_group.rules.len();
                sub_group.rules.retain(|r| r.id != rule_id);
                Ok(sub_group.rules.len() != before)
            }
            AutomationCommand::AssignSubGroup {
                user_id,
                username,
                sub_group_id,
            } => {
                if let Some(id) = &sub_group_id {
                    if self.sub_group(id).is_none() {
                        return Err(DocumentError::SubGroupNotFound(id.clone()));
                    }
                }
                let entry = self.user_points_entry(user_id, username);
                let changed = entry.sub_group_id != sub_group_id;
                entry.sub_group_id = sub_group_id;
                self.prune_points();
                Ok(changed)
            }
            AutomationCommand::Suspend(suspension) => {
                if suspension.expires_at <= suspension.suspended_at {
                    return Err(DocumentError::InvalidSuspensionWindow);
                }
                self.suspensions.retain(|s| s.user_id != suspension.user_id);
                self.suspensions.push(suspension);
                Ok(true)
            }
            AutomationCommand::Unsuspend { user_id } => {
                let before = self.suspensions.len();
                self.suspensions.retain(|s| s.user_id != user_id);
                Ok(self.suspensions.len() != before)
            }
            AutomationCommand::RemoveSuspensions { ids } => {
                let before = self.suspensions.len();
                self.suspensions.retain(|s| !ids.contains(&s.id));
                Ok(self.suspensions.len() != before)
            }
        }
    }

    #[must_use]
    pub fn user_points(&self, user_id: UserId) -> Option<&UserPoints> {
        self.user_points.iter().find(|u| u.user_id == user_id)
    }

    #[must_use]
    pub fn sub_group(&self, sub_group_id: &str) -> Option<&SubGroup> {
        self.sub_groups.iter().find(|s| s.id == sub_group_id)
    }

    /// The sub-group a member belongs to. A reference to a deleted sub-group
    /// reads as no sub-group.
    #[must_use]
    pub fn member_sub_group(&self, user_id: UserId) -> Option<&SubGroup> {
        self.user_points(user_id)
            .and_then(|u| u.sub_group_id.as_deref())
            .and_then(|id| self.sub_group(id))
    }

    #[must_use]
    pub fn active_suspension(&self, user_id: UserId) -> Option<&Suspension> {
        self.suspensions.iter().find(|s| s.user_id == user_id)
    }

    #[must_use]
    pub fn expired_suspensions(&self, now: DateTime<Utc>) -> Vec<Suspension> {
        self.suspensions
            .iter()
            .filter(|s| s.is_expired(now))
            .cloned()
            .collect()
    }

    fn user_points_entry(&mut self, user_id: UserId, username: String) -> &mut UserPoints {
        let idx = if let Some(idx) = self.user_points.iter().position(|u| u.user_id == user_id) {
            idx
        } else {
            self.user_points.push(UserPoints::new(user_id, username.clone()));
            self.user_points.len() - 1
        };
        let entry = &mut self.user_points[idx];
        if !username.is_empty() {
            entry.username = username;
        }
        entry
    }

    fn prune_points(&mut self) {
        self.user_points.retain(|u| !u.is_prunable());
    }
}

/// Thresholds act as keys within a scope, so a rule with an existing threshold
/// replaces the old one.
fn upsert_rule(rules: &mut Vec<Rule>, rule: Rule) {
    rules.retain(|r| r.points != rule.points && r.id != rule.id);
    rules.push(rule);
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::SubGroupNotFound(id) => write!(f, "sub-group {id} does not exist"),
            Self::InvalidSuspensionWindow => f.write_str("a suspension must expire after it starts"),
        }
    }
}

impl StdError for DocumentError {}
