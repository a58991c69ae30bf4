use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account Service API",
        version = "1.0.0",
        description = "Registration, login and user profiles.\n\n**Authentication:** `POST /api/login` returns a JWT valid for one hour; `GET /api/verify` checks it.\n\n**Features:**\n- Account signup with bcrypt-hashed passwords\n- Login issuing signed bearer tokens\n- Profile CRUD with optional image upload"
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::verify_token,

        // Profiles
        crate::api::users::add_user,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::get_user_image,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            // Auth
            crate::models::SignupRequest,
            crate::models::AccountResponse,
            crate::models::LoginRequest,
            crate::models::LoginResponse,
            crate::models::Gender,
            crate::models::City,
            crate::models::State,
            crate::api::auth::VerifyTokenResponse,

            // Profiles
            crate::api::users::AddProfileForm,
            crate::models::ProfileResponse,
            crate::models::ImageResponse,
            crate::models::ProfileUpdate,
            crate::models::MessageResponse,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login and token verification."),
        (name = "Users", description = "Profile records with an optional embedded image."),
        (name = "Health", description = "Health check for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/login"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/signup",
            "/api/login",
            "/api/verify",
            "/api/users/add",
            "/api/users",
            "/api/users/{id}",
            "/api/users/{id}/image",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
