use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use openhr_core::{ListParams, ServiceError};

use crate::api::{AppState, current_user};
use crate::model::{Claims, RegisterUser, Role};
use crate::service::user::UserFilter;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/register", post(register_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/users/{id}/roles", put(set_roles))
        .route("/users/{id}/manager", put(set_manager))
        .route("/users/{id}/active", put(set_active))
}

#[derive(Debug, Deserialize)]
struct UserListQuery {
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    manager_id: Option<String>,
    #[serde(default)]
    manager_email: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /users — public profile listing with optional filters.
async fn list_users(
    State(svc): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    // A manager email filter resolves to an id first.
    let manager_id = match (&query.manager_id, &query.manager_email) {
        (Some(id), _) => Some(id.clone()),
        (None, Some(email)) => {
            let manager = svc
                .find_user_by_email(email)
                .map_err(ServiceError::from)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("manager not found for email: {}", email))
                })?;
            Some(manager.id)
        }
        (None, None) => None,
    };

    let filter = UserFilter {
        department: query.department,
        manager_id,
    };
    let params = ListParams {
        limit: query.limit,
        offset: query.offset,
    };
    let result = svc.list_users(&filter, &params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

/// POST /users/register — create an account. The route policy already
/// restricts this to MANAGER/ADMIN.
async fn register_user(
    State(svc): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let user = svc.register_user(input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(user).unwrap()),
    ))
}

/// GET /users/{id} — profile, full or public per the viewer.
async fn get_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let profile = svc
        .get_user_profile(&id, &current)
        .map_err(ServiceError::from)?;
    Ok(Json(profile))
}

/// PUT /users/{id} — merge-patch profile update.
async fn update_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let user = svc
        .update_user(&id, patch, &current)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

/// DELETE /users/{id}.
async fn delete_user(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    let current = current_user(&svc, &claims)?;
    svc.delete_user(&id, &current).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RolesBody {
    roles: Vec<Role>,
}

/// PUT /users/{id}/roles.
async fn set_roles(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(body): Json<RolesBody>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let user = svc
        .set_user_roles(&id, body.roles, &current)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

#[derive(Debug, Deserialize)]
struct ManagerBody {
    #[serde(default)]
    manager_id: Option<String>,
}

/// PUT /users/{id}/manager.
async fn set_manager(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(body): Json<ManagerBody>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let user = svc
        .set_user_manager(&id, body.manager_id, &current)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

#[derive(Debug, Deserialize)]
struct ActiveBody {
    active: bool,
}

/// PUT /users/{id}/active — activate or deactivate an account.
async fn set_active(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(body): Json<ActiveBody>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let current = current_user(&svc, &claims)?;
    let user = svc
        .set_user_active(&id, body.active, &current)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}
