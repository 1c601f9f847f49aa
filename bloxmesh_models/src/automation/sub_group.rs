use serde::{Deserialize, Serialize};

use super::rule::SubGroupRule;

/// A named partition of members with its own promotion thresholds.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubGroup {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub rules: Vec<SubGroupRule>,
    /// Members of an excluded sub-group never fall back to the global rules.
    #[serde(default)]
    pub exclude_from_general_automation: bool,
}
