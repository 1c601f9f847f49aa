use bloxmesh_models::automation::{Rule, SubGroup};

/// Picks the rule a member with `points` points should be on.
///
/// Rules of the member's sub-group win over the global rules whenever one of
/// them qualifies. When none does, the global rules are consulted unless the
/// sub-group is excluded from general automation.
#[must_use]
pub fn evaluate<'r>(
    points: u64,
    sub_group: Option<&'r SubGroup>,
    global_rules: &'r [Rule],
) -> Option<&'r Rule> {
    if let Some(sub_group) = sub_group {
        if let Some(rule) = highest_qualifying(&sub_group.rules, points) {
            return Some(rule);
        }
        if sub_group.exclude_from_general_automation {
            return None;
        }
    }

    highest_qualifying(global_rules, points)
}

/// The rule with the largest threshold not above `points`. On duplicate
/// thresholds the earliest rule in the list wins.
fn highest_qualifying(rules: &[Rule], points: u64) -> Option<&Rule> {
    rules
        .iter()
        .filter(|r| r.points <= points)
        .fold(None, |best: Option<&Rule>, rule| match best {
            Some(best) if best.points >= rule.points => Some(best),
            _ => Some(rule),
        })
}
