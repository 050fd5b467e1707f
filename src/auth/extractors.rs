use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use super::{claims::Identity, jwt::TokenError, services::AuthService};

/// Why the gate turned a request away. Only logged; callers always see a bare 401.
#[derive(Debug, Error)]
pub enum GateRejection {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid auth scheme")]
    InvalidScheme,
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response()
    }
}

/// Extracts the bearer token from `headers` and resolves it to an identity.
pub(crate) fn authenticate(
    headers: &HeaderMap,
    auth: &AuthService,
) -> Result<Identity, GateRejection> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(GateRejection::MissingHeader)?
        .to_str()
        .map_err(|_| GateRejection::InvalidScheme)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(GateRejection::InvalidScheme)?;

    let identity = auth.resolve_identity(token)?;
    debug!(user_id = %identity.user_id, "request authenticated");
    Ok(identity)
}

/// Middleware for protected routes: rejects with 401 or stores the `Identity`
/// in request extensions before running the rest of the pipeline.
pub async fn require_auth(
    State(auth): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    let outcome = authenticate(request.headers(), &auth);
    match outcome {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(rejection) => {
            warn!(reason = %rejection, uri = %request.uri(), "request rejected");
            Err(rejection)
        }
    }
}

/// Identity of the caller. Reads what `require_auth` stored, or authenticates
/// on the spot when the route has no gate layered on it.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }

        let auth = AuthService::from_ref(state);
        match authenticate(&parts.headers, &auth) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(rejection) => {
                warn!(reason = %rejection, "request rejected");
                Err(rejection)
            }
        }
    }
}
