use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::roblox::id::{GroupId, RoleId, UserId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditLog {
    pub kind: AuditLogKind,
    pub metadata: AuditLogData,
    pub group_id: GroupId,
    /// The dashboard operator, or `None` for the background sweeper.
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, Ord, PartialEq, PartialOrd, Serialize_repr)]
#[repr(u16)]
pub enum AuditLogKind {
    PointsAdd = 1,
    PointsRemove = 2,
    PointsSet = 3,
    SetRank = 4,
    Suspend = 5,
    Unsuspend = 6,
    SuspensionExpired = 7,
    RuleCreate = 8,
    RuleDelete = 9,
    SettingModify = 10,
    SubGroupCreate = 11,
    SubGroupModify = 12,
    SubGroupDelete = 13,
    Kick = 14,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AuditLogData {
    Points {
        target_roblox_user: UserId,
        username: String,
        delta: i64,
        total: u64,
    },
    SetRank {
        target_roblox_user: UserId,
        from: Option<RoleId>,
        to: RoleId,
        role_name: String,
    },
    Suspend {
        target_roblox_user: UserId,
        username: String,
        previous_role: RoleId,
        expires_at: DateTime<Utc>,
    },
    Unsuspend {
        target_roblox_user: UserId,
        username: String,
        restored_role: RoleId,
        restored: bool,
    },
    Rule {
        id: String,
        points: u64,
        role_id: RoleId,
        sub_group_id: Option<String>,
    },
    SettingModify {
        setting: String,
        value: String,
    },
    SubGroup {
        id: String,
        name: String,
    },
    Kick {
        target_roblox_user: UserId,
    },
}

impl Display for AuditLogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::PointsAdd => f.write_str("Points Added"),
            Self::PointsRemove => f.write_str("Points Removed"),
            Self::PointsSet => f.write_str("Points Set"),
            Self::SetRank => f.write_str("Rank Changed"),
            Self::Suspend => f.write_str("Member Suspended"),
            Self::Unsuspend => f.write_str("Member Unsuspended"),
            Self::SuspensionExpired => f.write_str("Suspension Expired"),
            Self::RuleCreate => f.write_str("Promotion Rule Created"),
            Self::RuleDelete => f.write_str("Promotion Rule Deleted"),
            Self::SettingModify => f.write_str("Setting Modified"),
            Self::SubGroupCreate => f.write_str("Sub-group Created"),
            Self::SubGroupModify => f.write_str("Sub-group Modified"),
            Self::SubGroupDelete => f.write_str("Sub-group Deleted"),
            Self::Kick => f.write_str("Member Kicked"),
        }
    }
}

impl AuditLogData {
    /// Key/value pairs describing the entry, used when rendering it.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Points {
                target_roblox_user,
                username,
                delta,
                total,
            } => vec![
                ("User", format!("{username} ({target_roblox_user})")),
                ("Change", format!("{delta:+}")),
                ("Total", total.to_string()),
            ],
            Self::SetRank {
                target_roblox_user,
                from,
                to,
                role_name,
            } => vec![
                ("User", target_roblox_user.to_string()),
                (
                    "From",
                    from.map_or_else(|| "Unknown".to_string(), |r| r.to_string()),
                ),
                ("To", format!("{role_name} ({to})")),
            ],
            Self::Suspend {
                target_roblox_user,
                username,
                previous_role,
                expires_at,
            } => vec![
                ("User", format!("{username} ({target_roblox_user})")),
                ("Previous Role", previous_role.to_string()),
                ("Expires", format!("<t:{}:R>", expires_at.timestamp())),
            ],
            Self::Unsuspend {
                target_roblox_user,
                username,
                restored_role,
                restored,
            } => vec![
                ("User", format!("{username} ({target_roblox_user})")),
                ("Restored Role", restored_role.to_string()),
                ("Role Restored", if *restored { "Yes" } else { "No" }.into()),
            ],
            Self::Rule {
                id,
                points,
                role_id,
                sub_group_id,
            } => {
                let mut fields = vec![
                    ("Rule", id.clone()),
                    ("Points", points.to_string()),
                    ("Role", role_id.to_string()),
                ];
                if let Some(sub_group_id) = sub_group_id {
                    fields.push(("Sub-group", sub_group_id.clone()));
                }
                fields
            }
            Self::SettingModify { setting, value } => {
                vec![("Setting", setting.clone()), ("Value", value.clone())]
            }
            Self::SubGroup { id, name } => vec![("Sub-group", format!("{name} ({id})"))],
            Self::Kick { target_roblox_user } => {
                vec![("User", target_roblox_user.to_string())]
            }
        }
    }
}
