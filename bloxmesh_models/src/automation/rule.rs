use serde::{Deserialize, Serialize};

use crate::roblox::id::RoleId;

/// A promotion threshold. A member holding at least `points` points is moved
/// to `role_id`, unless a rule with a higher qualifying threshold exists in
/// the same scope.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub points: u64,
    pub role_id: RoleId,
    pub role_name: String,
}

/// Sub-group thresholds share the shape of the global ones.
pub type SubGroupRule = Rule;
