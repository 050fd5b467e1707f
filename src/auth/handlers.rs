use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest, TokenResponse},
        error::AuthError,
        extractors::{require_auth, AuthUser},
        services::AuthService,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

pub fn me_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(auth, payload))]
pub async fn signup(
    State(auth): State<AuthService>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = auth.signup(&payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let token = auth.login(&payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(auth))]
pub async fn get_me(
    State(auth): State<AuthService>,
    AuthUser(identity): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    match auth.find_user(identity.user_id).await? {
        Some(user) => Ok(Json(user.into())),
        None => {
            error!(user_id = %identity.user_id, "token subject has no user record");
            Err(AuthError::InvalidCredentials)
        }
    }
}
