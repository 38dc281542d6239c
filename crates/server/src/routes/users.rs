use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequest, Query, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use service::users::{
    domain::{LoginInput, PublicUser, RegisterInput},
    UserService,
};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub users: UserService,
}

#[derive(Debug, Serialize)]
pub struct AuthOutput {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UserOutput {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct DebugUsersOutput {
    pub count: usize,
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body accepted as JSON or `application/x-www-form-urlencoded`.
///
/// An absent or unparseable body yields `T::default()` so it surfaces as missing fields.
pub struct FormOrJson<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[async_trait]
impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let parsed = if is_form(&req) {
            Form::<T>::from_request(req, state).await.map(|Form(v)| v).map_err(|e| e.body_text())
        } else {
            Json::<T>::from_request(req, state).await.map(|Json(v)| v).map_err(|e| e.body_text())
        };
        match parsed {
            Ok(v) => Ok(Self(v)),
            Err(rejection) => {
                debug!(%rejection, "request body rejected; treating as empty");
                Ok(Self(T::default()))
            }
        }
    }
}

pub async fn register(
    State(state): State<ServerState>,
    FormOrJson(input): FormOrJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthOutput>), ApiError> {
    let user = state.users.register(input).await?;
    Ok((StatusCode::CREATED, Json(AuthOutput { message: "Registered", user })))
}

pub async fn login(
    State(state): State<ServerState>,
    FormOrJson(input): FormOrJson<LoginInput>,
) -> Result<Json<AuthOutput>, ApiError> {
    let user = state.users.login(input).await?;
    Ok(Json(AuthOutput { message: "Logged in", user }))
}

pub async fn current_user(
    State(state): State<ServerState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserOutput>, ApiError> {
    let email = query.ok().and_then(|Query(q)| q.email).unwrap_or_default();
    let user = state.users.lookup(&email).await?;
    Ok(Json(UserOutput { user }))
}

/// Lists every account without authentication. Mounted only when enabled in config.
pub async fn debug_users(State(state): State<ServerState>) -> Result<Json<DebugUsersOutput>, ApiError> {
    let users = state.users.list_public().await?;
    Ok(Json(DebugUsersOutput { count: users.len(), users }))
}
