use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roblox::id::{RoleId, UserId};

/// The single role a group uses to mark suspended members.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedRole {
    pub role_id: RoleId,
    pub role_name: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suspension {
    pub id: String,
    pub user_id: UserId,
    pub username: String,
    /// The role the member held before being suspended, restored on expiry.
    pub previous_role_id: RoleId,
    pub previous_role_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub suspended_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Suspension {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
