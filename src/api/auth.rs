use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::models::{AccountResponse, LoginRequest, LoginResponse, SignupRequest};
use crate::services::auth_service;
use crate::state::AppState;
use crate::utils::{AppError, LoginRejection};

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub exp: usize,
}

#[utoipa::path(
    post,
    path = "/api/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation error or email already registered")
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    let email = request.email.clone();
    log::info!("📝 POST /api/signup - email: {}", email);

    match auth_service::signup(&state, request).await {
        Ok(account) => HttpResponse::Created().json(AccountResponse::from(account)),
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "User not found or invalid credentials"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /api/login - email: {}", request.email);

    match auth_service::login(&state, &request).await {
        Ok(success) => {
            log::info!(
                "✅ Login successful: {} ({}), token expires at {}",
                request.email,
                success.account_id,
                success.expires_at
            );
            HttpResponse::Ok().json(LoginResponse {
                token: success.token,
                message: "Login successful".to_string(),
            })
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return AppError::Rejected(LoginRejection::InvalidToken).error_response();
    };

    match state.credentials.decode_token(token) {
        Ok(claims) => HttpResponse::Ok().json(VerifyTokenResponse {
            valid: true,
            user_id: claims.user_id,
            exp: claims.exp,
        }),
        Err(e) => {
            log::warn!("❌ Invalid token: {}", e);
            e.error_response()
        }
    }
}
