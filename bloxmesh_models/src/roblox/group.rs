use serde::{Deserialize, Serialize};

use super::id::{GroupId, RoleId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PartialGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(rename = "memberCount", default)]
    pub member_count: Option<i64>,
}

/// A role of a group as returned by the legacy groups API. `rank` is the 0-255
/// ordering value; a higher rank outranks a lower one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupRole {
    pub id: RoleId,
    pub name: String,
    pub rank: u32,
    #[serde(rename = "memberCount", default)]
    pub member_count: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GroupUserRole {
    pub group: PartialGroup,
    pub role: GroupRole,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GroupRoles {
    #[serde(rename = "groupId")]
    pub group_id: GroupId,
    #[serde(default)]
    pub roles: Vec<GroupRole>,
}
