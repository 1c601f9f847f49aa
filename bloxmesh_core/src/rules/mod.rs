mod add;
mod delete;

pub use add::{add_rule, AddRule, AddRuleError, RuleArguments};
pub use delete::{delete_rule, DeleteRule};
