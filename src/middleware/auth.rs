use axum::{
    extract::Request,
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_token, Claims, TokenKind};
use crate::error::ApiError;

/// Authenticated user context extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            is_staff: claims.is_staff,
        }
    }
}

/// JWT authentication middleware that validates access tokens and injects
/// [`AuthUser`] into the request extensions.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)
        .map_err(|_| ApiError::unauthorized("No estás autenticado para acceder a este recurso"))?;

    let claims = decode_token(&token, TokenKind::Access)
        .map_err(|_| ApiError::unauthorized("No estás autenticado para acceder a este recurso"))?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// "Admin or read only" policy: safe verbs pass for any authenticated user,
/// write verbs require the staff flag. Must run after [`jwt_auth_middleware`].
pub async fn admin_or_read_only_middleware(
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_safe_method(request.method()) {
        require_staff(&request)?;
    }
    Ok(next.run(request).await)
}

/// Staff requirement for every verb (user administration)
pub async fn staff_only_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    require_staff(&request)?;
    Ok(next.run(request).await)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn require_staff(request: &Request) -> Result<(), ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("No estás autenticado para acceder a este recurso"))?;
    if !user.is_staff {
        return Err(ApiError::forbidden("No tienes permiso para realizar esta acción"));
    }
    Ok(())
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
