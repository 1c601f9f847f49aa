use serde::{Deserialize, Serialize};

use crate::roblox::id::UserId;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoints {
    pub user_id: UserId,
    pub username: String,
    pub points: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_group_id: Option<String>,
}

impl UserPoints {
    #[must_use]
    pub fn new(user_id: UserId, username: String) -> Self {
        Self {
            user_id,
            username,
            points: 0,
            sub_group_id: None,
        }
    }

    /// Applies a signed change, clamping at zero.
    pub fn adjust(&mut self, delta: i64) {
        self.points = if delta >= 0 {
            self.points.saturating_add(delta.unsigned_abs())
        } else {
            self.points.saturating_sub(delta.unsigned_abs())
        };
    }

    /// Entries carrying nothing worth keeping can be dropped from the document.
    #[must_use]
    pub fn is_prunable(&self) -> bool {
        self.points == 0 && self.sub_group_id.is_none()
    }
}
