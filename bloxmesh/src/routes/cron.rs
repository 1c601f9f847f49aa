use axum::{extract::State, http::HeaderMap, Json};
use bloxmesh_core::suspensions::SweepReport;
use chrono::Utc;

use crate::{error::ApiError, state::AppState};

/// Runs the suspension sweep on demand, for deployments that drive it from an
/// external scheduler. Shares the in-flight guard with the timer.
pub async fn process_suspensions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, ApiError> {
    if let Some(secret) = &state.cron_secret {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if token != Some(secret.as_ref()) {
            return Err(ApiError::Unauthorized);
        }
    }

    let report = state.sweeper.run_once(Utc::now()).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use crate::routes::tests::{app, send};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    #[tokio::test]
    async fn secret_is_required_when_configured() {
        let (app, _) = app(Some("hunter2"));

        let request = Request::get("/cron/process-suspensions").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::post("/cron/process-suspensions")
            .header("authorization", "Bearer hunter2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"], 0);
        assert_eq!(body["restored"], 0);
        assert_eq!(body["skipped"], false);
    }
}
