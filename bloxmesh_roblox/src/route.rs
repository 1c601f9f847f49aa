use std::fmt::{Display, Formatter, Result as FmtResult};

pub enum Route {
    GroupMember { group_id: u64, user_id: u64 },
    GroupRoles { group_id: u64 },
    UserGroupRoles { user_id: u64 },
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::GroupMember { group_id, user_id } => write!(
                f,
                "https://groups.roblox.com/v1/groups/{group_id}/users/{user_id}"
            ),
            Route::GroupRoles { group_id } => {
                write!(f, "https://groups.roblox.com/v1/groups/{group_id}/roles")
            }
            Route::UserGroupRoles { user_id } => write!(
                f,
                "https://groups.roblox.com/v2/users/{user_id}/groups/roles"
            ),
        }
    }
}
