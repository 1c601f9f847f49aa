use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use bloxmesh_core::{
    automation,
    points::{update_points, PointsArguments, PointsChange},
    rules::{add_rule, delete_rule, RuleArguments},
    sub_groups::{assign_sub_group, create_sub_group, delete_sub_group, SubGroupArguments},
    suspensions::{
        clear_suspended_role, set_suspended_role, suspend, unsuspend,
        SuspendArguments,
    },
};
use bloxmesh_models::{
    automation::AutomationDocument,
    roblox::id::{GroupId, RoleId, UserId},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::actor;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    Suspend {
        user_id: UserId,
        #[serde(default)]
        username: String,
        previous_role_id: RoleId,
        #[serde(default)]
        previous_role_name: String,
        duration_ms: u64,
    },
    UnsuspendUser {
        user_id: UserId,
    },
    CleanExpiredSuspensions,
    UpdatePoints {
        user_id: UserId,
        #[serde(default)]
        username: String,
        points_delta: i64,
        #[serde(default)]
        confirm_demotion: bool,
    },
    SetPoints {
        user_id: UserId,
        #[serde(default)]
        username: String,
        points: u64,
        #[serde(default)]
        confirm_demotion: bool,
    },
    AddRule {
        points: u64,
        role_id: RoleId,
    },
    DeleteRule {
        rule_id: String,
    },
    SetSuspendedRole {
        role_id: RoleId,
    },
    ClearSuspendedRole,
    CreateSubGroup {
        name: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        exclude_from_general_automation: bool,
    },
    DeleteSubGroup {
        sub_group_id: String,
    },
    AddSubGroupRule {
        sub_group_id: String,
        points: u64,
        role_id: RoleId,
    },
    DeleteSubGroupRule {
        sub_group_id: String,
        rule_id: String,
    },
    AssignSubGroup {
        user_id: UserId,
        #[serde(default)]
        username: String,
        #[serde(default)]
        sub_group_id: Option<String>,
    },
}

pub async fn get_automation(
    State(state): State<AppState>,
    Path(group_id): Path<u64>,
) -> Result<Json<AutomationDocument>, ApiError> {
    let document = automation::load(&state.database, GroupId(group_id)).await?;
    Ok(Json(document))
}

#[tracing::instrument(skip_all, fields(group_id = group_id))]
pub async fn post_automation(
    State(state): State<AppState>,
    Path(group_id): Path<u64>,
    headers: HeaderMap,
    Json(action): Json<Action>,
) -> Result<Json<Value>, ApiError> {
    let group_id = GroupId(group_id);
    let actor = actor(&headers);
    let actor = actor.as_deref();
    let roblox = state.roblox.as_ref();
    let database = &state.database;
    let audit = state.audit.as_ref();

    let response = match action {
        Action::Suspend {
            user_id,
            username,
            previous_role_id,
            previous_role_name,
            duration_ms,
        } => {
            let args = SuspendArguments {
                user_id,
                username,
                previous_role_id,
                previous_role_name,
                duration_ms,
            };
            let res = suspend(roblox, database, audit, group_id, actor, args).await?;
            json!({ "document": res.document, "suspension": res.suspension })
        }
        Action::UnsuspendUser { user_id } => {
            let res = unsuspend(roblox, database, audit, group_id, actor, user_id).await?;
            json!({
                "document": res.document,
                "released": res.released.is_some(),
                "restored": res.restored,
            })
        }
        Action::CleanExpiredSuspensions => {
            let (document, report) = state.sweeper.run_group(group_id, Utc::now()).await?;
            json!({
                "document": document,
                "processed": report.processed,
                "restored": report.restored,
                "skipped": report.skipped,
            })
        }
        Action::UpdatePoints {
            user_id,
            username,
            points_delta,
            confirm_demotion,
        } => {
            let args = PointsArguments {
                user_id,
                username,
                change: PointsChange::Delta(points_delta),
                confirm_demotion,
            };
            let res = update_points(roblox, database, audit, group_id, actor, args).await?;
            json!({ "document": res.document, "points": res.points, "promotion": res.promotion })
        }
        Action::SetPoints {
            user_id,
            username,
            points,
            confirm_demotion,
        } => {
            let args = PointsArguments {
                user_id,
                username,
                change: PointsChange::Set(points),
                confirm_demotion,
            };
            let res = update_points(roblox, database, audit, group_id, actor, args).await?;
            json!({ "document": res.document, "points": res.points, "promotion": res.promotion })
        }
        Action::AddRule { points, role_id } => {
            let args = RuleArguments {
                points,
                role_id,
                sub_group_id: None,
            };
            let res = add_rule(roblox, database, audit, group_id, actor, args).await?;
            json!({ "document": res.document, "rule": res.rule })
        }
        Action::DeleteRule { rule_id } => {
            let res = delete_rule(database, audit, group_id, actor, rule_id, None).await?;
            json!({ "document": res.document, "deleted": res.deleted.is_some() })
        }
        Action::SetSuspendedRole { role_id } => {
            let document =
                set_suspended_role(roblox, database, audit, group_id, actor, role_id).await?;
            json!({ "document": document })
        }
        Action::ClearSuspendedRole => {
            let document = clear_suspended_role(database, audit, group_id, actor).await?;
            json!({ "document": document })
        }
        Action::CreateSubGroup {
            name,
            color,
            exclude_from_general_automation,
        } => {
            let args = SubGroupArguments {
                name,
                color,
                exclude_from_general_automation,
            };
            let (document, sub_group) =
                create_sub_group(database, audit, group_id, actor, args).await?;
            json!({ "document": document, "subGroup": sub_group })
        }
        Action::DeleteSubGroup { sub_group_id } => {
            let (document, deleted) =
                delete_sub_group(database, audit, group_id, actor, sub_group_id).await?;
            json!({ "document": document, "deleted": deleted.is_some() })
        }
        Action::AddSubGroupRule {
            sub_group_id,
            points,
            role_id,
        } => {
            let args = RuleArguments {
                points,
                role_id,
                sub_group_id: Some(sub_group_id),
            };
            let res = add_rule(roblox, database, audit, group_id, actor, args).await?;
            json!({ "document": res.document, "rule": res.rule })
        }
        Action::DeleteSubGroupRule {
            sub_group_id,
            rule_id,
        } => {
            let res =
                delete_rule(database, audit, group_id, actor, rule_id, Some(sub_group_id)).await?;
            json!({ "document": res.document, "deleted": res.deleted.is_some() })
        }
        Action::AssignSubGroup {
            user_id,
            username,
            sub_group_id,
        } => {
            let document =
                assign_sub_group(database, audit, group_id, actor, user_id, username, sub_group_id)
                    .await?;
            json!({ "document": document })
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{app, post, send};
    use axum::{body::Body, http::{Request, StatusCode}};

    #[test]
    fn actions_use_camel_case() {
        let action: Action = serde_json::from_value(json!({
            "action": "updatePoints",
            "userId": "42",
            "pointsDelta": -5
        }))
        .unwrap();
        assert!(matches!(
            action,
            Action::UpdatePoints { user_id: UserId(42), points_delta: -5, confirm_demotion: false, .. }
        ));

        let action: Action = serde_json::from_value(json!({ "action": "cleanExpiredSuspensions" })).unwrap();
        assert!(matches!(action, Action::CleanExpiredSuspensions));

        assert!(serde_json::from_value::<Action>(json!({ "action": "explode" })).is_err());
    }

    #[tokio::test]
    async fn missing_document_reads_as_empty() {
        let (app, _) = app(None);
        let request = Request::get("/groups/1/automation").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"], json!([]));
        assert_eq!(body["suspensions"], json!([]));
    }

    #[tokio::test]
    async fn points_drive_promotions_over_http() {
        let (app, roblox) = app(None);

        let (status, _) = send(
            &app,
            post("/groups/1/automation", &json!({ "action": "addRule", "points": 10, "roleId": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            post(
                "/groups/1/automation",
                &json!({ "action": "updatePoints", "userId": 5, "username": "five", "pointsDelta": 12 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 12);
        assert_eq!(body["promotion"]["outcome"], "promoted");
        assert_eq!(
            roblox.calls.lock().unwrap().clone(),
            vec![(GroupId(1), UserId(5), RoleId(2))]
        );
    }

    #[tokio::test]
    async fn suspend_without_suspended_role_is_a_bad_request() {
        let (app, roblox) = app(None);
        let (status, body) = send(
            &app,
            post(
                "/groups/1/automation",
                &json!({
                    "action": "suspend",
                    "userId": 5,
                    "username": "five",
                    "previousRoleId": 1,
                    "previousRoleName": "Role 1",
                    "durationMs": 60000
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert!(roblox.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_restores_expired_suspensions_through_the_sweeper() {
        let (app, roblox) = app(None);
        let (status, _) = send(
            &app,
            post("/groups/1/automation", &json!({ "action": "setSuspendedRole", "roleId": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            post(
                "/groups/1/automation",
                &json!({
                    "action": "suspend",
                    "userId": 5,
                    "previousRoleId": 1,
                    "durationMs": 1
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (status, body) = send(
            &app,
            post("/groups/1/automation", &json!({ "action": "cleanExpiredSuspensions" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"], 1);
        assert_eq!(body["restored"], 1);
        assert_eq!(body["skipped"], false);
        assert_eq!(body["document"]["suspensions"], json!([]));
        assert_eq!(
            roblox.calls.lock().unwrap().clone(),
            vec![
                (GroupId(1), UserId(5), RoleId(3)),
                (GroupId(1), UserId(5), RoleId(1)),
            ]
        );
    }
}
