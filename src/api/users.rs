use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, ResponseError};
use futures::StreamExt;
use serde::Deserialize;

use crate::models::{MessageResponse, NewProfile, ProfileImage, ProfileResponse, ProfileUpdate};
use crate::services::profile_service;
use crate::state::AppState;
use crate::utils::AppError;

const DEFAULT_IMAGE_TYPE: &str = "application/octet-stream";
const MAX_TEXT_FIELD_BYTES: usize = 256;

/// Schema-only mirror of the multipart form accepted by `POST /api/users/add`.
#[allow(dead_code)]
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProfileForm {
    pub user_name: String,
    pub email: String,
    pub mobile: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Reads the form fields. The image is capped at `image_limit` bytes,
/// every other field at `MAX_TEXT_FIELD_BYTES`.
async fn read_profile_form(
    mut payload: Multipart,
    image_limit: usize,
) -> Result<NewProfile, AppError> {
    let mut form = NewProfile::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Invalid multipart data: {}", e)))?;

        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|mime| mime.to_string());
        let limit = if name == "image" {
            image_limit
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::Validation(format!("Failed to read {}: {}", name, e)))?;
            if data.len() + chunk.len() > limit {
                return Err(AppError::Validation(format!(
                    "{} too large. Maximum size: {} bytes",
                    name, limit
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "userName" => form.user_name = text_field(&name, data)?,
            "email" => form.email = text_field(&name, data)?,
            "mobile" => form.mobile = text_field(&name, data)?,
            "image" if !data.is_empty() => {
                log::info!("🖼️ Received image: {} bytes", data.len());
                let content_type = content_type.unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());
                form.image = Some(ProfileImage::new(data, content_type));
            }
            "image" => {}
            other => log::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn text_field(name: &str, data: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(data).map_err(|_| AppError::Validation(format!("{} must be UTF-8 text", name)))
}

#[utoipa::path(
    post,
    path = "/api/users/add",
    tag = "Users",
    request_body(content = AddProfileForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Validation error or email already registered")
    )
)]
pub async fn add_user(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    log::info!("📝 POST /api/users/add");

    let form = match read_profile_form(payload, state.max_image_bytes).await {
        Ok(form) => form,
        Err(e) => {
            log::warn!("❌ Rejected upload: {}", e);
            return e.error_response();
        }
    };
    let email = form.email.clone();

    match profile_service::create_profile(&state, form).await {
        Ok(profile) => HttpResponse::Created().json(ProfileResponse::from(profile)),
        Err(e) => {
            log::warn!("❌ Error adding user {}: {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All profiles", body = [ProfileResponse]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn list_users(state: web::Data<AppState>) -> HttpResponse {
    match profile_service::list_profiles(&state).await {
        Ok(profiles) => {
            log::info!("📋 GET /api/users - {} profiles", profiles.len());
            let body: Vec<ProfileResponse> = profiles.into_iter().map(ProfileResponse::from).collect();
            HttpResponse::Ok().json(body)
        }
        Err(e) => {
            log::error!("❌ Error fetching users: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile with base64 image", body = ProfileResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(state: web::Data<AppState>, id: web::Path<String>) -> HttpResponse {
    match profile_service::get_profile(&state, &id).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse::from(profile)),
        Err(e) => {
            log::warn!("❌ GET /api/users/{} - {}", id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/image",
    tag = "Users",
    params(("id" = String, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Raw image bytes with the stored Content-Type"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_user_image(state: web::Data<AppState>, id: web::Path<String>) -> HttpResponse {
    match profile_service::get_profile_image(&state, &id).await {
        Ok(image) => HttpResponse::Ok()
            .content_type(image.content_type.as_str())
            .body(image.data.bytes),
        Err(e) => {
            log::warn!("❌ GET /api/users/{}/image - {}", id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Profile id")),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Unknown field, empty value or email taken"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
    update: web::Json<ProfileUpdate>,
) -> HttpResponse {
    log::info!("🔧 PATCH /api/users/{}", id);

    match profile_service::update_profile(&state, &id, update.into_inner()).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse::from(profile)),
        Err(e) => {
            log::warn!("❌ Failed to update {}: {}", id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(state: web::Data<AppState>, id: web::Path<String>) -> HttpResponse {
    log::info!("🗑️ DELETE /api/users/{}", id);

    match profile_service::delete_profile(&state, &id).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse {
            message: "User deleted successfully".to_string(),
        }),
        Err(e) => {
            log::warn!("❌ Failed to delete {}: {}", id, e);
            e.error_response()
        }
    }
}
