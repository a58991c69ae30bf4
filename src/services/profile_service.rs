use crate::{
    database::with_timeout,
    models::{NewProfile, Profile, ProfileImage, ProfileUpdate},
    state::AppState,
    utils::{AppError, DUPLICATE_EMAIL_MESSAGE},
};
use mongodb::bson::oid::ObjectId;

const USER_NOT_FOUND: &str = "User not found";
const IMAGE_NOT_FOUND: &str = "Image not found";

/// Malformed ids can't match anything, so they read as not found.
fn parse_id(id: &str, missing: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound(missing.to_string()))
}

pub async fn create_profile(state: &AppState, new_profile: NewProfile) -> Result<Profile, AppError> {
    new_profile.validate().map_err(AppError::Validation)?;

    if let Some(image) = &new_profile.image {
        if image.bytes().len() > state.max_image_bytes {
            return Err(AppError::Validation(format!(
                "Image too large. Maximum size: {} bytes",
                state.max_image_bytes
            )));
        }
    }

    let existing = with_timeout(
        state.storage_timeout,
        state.profiles.find_by_email(&new_profile.email),
    )
    .await?;
    if existing.is_some() {
        return Err(AppError::Validation(DUPLICATE_EMAIL_MESSAGE.to_string()));
    }

    let profile = Profile::new(
        new_profile.user_name,
        new_profile.email,
        new_profile.mobile,
        new_profile.image,
    );
    with_timeout(state.storage_timeout, state.profiles.insert(&profile)).await?;

    log::info!("✅ Profile created: {} ({})", profile.email, profile.id.to_hex());
    Ok(profile)
}

pub async fn list_profiles(state: &AppState) -> Result<Vec<Profile>, AppError> {
    Ok(with_timeout(state.storage_timeout, state.profiles.list()).await?)
}

pub async fn get_profile(state: &AppState, id: &str) -> Result<Profile, AppError> {
    let id = parse_id(id, USER_NOT_FOUND)?;
    with_timeout(state.storage_timeout, state.profiles.find_by_id(&id))
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
}

pub async fn get_profile_image(state: &AppState, id: &str) -> Result<ProfileImage, AppError> {
    let id = parse_id(id, IMAGE_NOT_FOUND)?;
    with_timeout(state.storage_timeout, state.profiles.find_by_id(&id))
        .await?
        .and_then(|profile| profile.image)
        .filter(|image| !image.bytes().is_empty())
        .ok_or_else(|| AppError::NotFound(IMAGE_NOT_FOUND.to_string()))
}

/// Never creates a record: an unknown id is `NotFound`.
pub async fn update_profile(
    state: &AppState,
    id: &str,
    update: ProfileUpdate,
) -> Result<Profile, AppError> {
    let id = parse_id(id, USER_NOT_FOUND)?;
    update.validate().map_err(AppError::Validation)?;

    if let Some(email) = &update.email {
        let holder = with_timeout(state.storage_timeout, state.profiles.find_by_email(email)).await?;
        if holder.is_some_and(|p| p.id != id) {
            return Err(AppError::Validation(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }
    }

    with_timeout(state.storage_timeout, state.profiles.update(&id, &update))
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
}

pub async fn delete_profile(state: &AppState, id: &str) -> Result<(), AppError> {
    let id = parse_id(id, USER_NOT_FOUND)?;
    let removed = with_timeout(state.storage_timeout, state.profiles.delete(&id)).await?;
    if !removed {
        return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
    }
    log::info!("🗑️ Profile {} deleted", id.to_hex());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state() -> AppState {
        AppState::in_memory(&Config::for_tests())
    }

    fn new_profile(email: &str, image: Option<ProfileImage>) -> NewProfile {
        NewProfile {
            user_name: "Ravi".to_string(),
            email: email.to_string(),
            mobile: "9000000000".to_string(),
            image,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let state = state();
        let first = create_profile(&state, new_profile("a@x.com", None)).await.unwrap();

        let err = create_profile(&state, new_profile("a@x.com", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(list_profiles(&state).await.unwrap().len(), 1);
        assert_eq!(get_profile(&state, &first.id.to_hex()).await.unwrap().user_name, "Ravi");
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let state = state();
        let image = ProfileImage::new(vec![0u8; state.max_image_bytes + 1], "image/png");
        let err = create_profile(&state, new_profile("a@x.com", Some(image))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn image_round_trips_with_content_type() {
        let state = state();
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        let image = ProfileImage::new(bytes.clone(), "image/jpeg");
        let profile = create_profile(&state, new_profile("a@x.com", Some(image))).await.unwrap();

        let fetched = get_profile_image(&state, &profile.id.to_hex()).await.unwrap();
        assert_eq!(fetched.bytes(), bytes.as_slice());
        assert_eq!(fetched.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn profile_without_image_has_no_image() {
        let state = state();
        let profile = create_profile(&state, new_profile("a@x.com", None)).await.unwrap();
        let err = get_profile_image(&state, &profile.id.to_hex()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn patch_of_missing_id_is_not_found_and_creates_nothing() {
        let state = state();
        let update = ProfileUpdate {
            user_name: Some("x".into()),
            ..Default::default()
        };
        let err = update_profile(&state, &ObjectId::new().to_hex(), update.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = update_profile(&state, "not-an-id", update).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(list_profiles(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_updates_allowed_fields() {
        let state = state();
        let profile = create_profile(&state, new_profile("a@x.com", None)).await.unwrap();
        let update = ProfileUpdate {
            mobile: Some("8000000000".into()),
            ..Default::default()
        };
        let updated = update_profile(&state, &profile.id.to_hex(), update).await.unwrap();
        assert_eq!(updated.mobile, "8000000000");
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.created_at, profile.created_at);
    }

    #[tokio::test]
    async fn patch_keeping_own_email_is_allowed() {
        let state = state();
        let profile = create_profile(&state, new_profile("a@x.com", None)).await.unwrap();
        let update = ProfileUpdate {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(update_profile(&state, &profile.id.to_hex(), update).await.is_ok());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let state = state();
        let profile = create_profile(&state, new_profile("a@x.com", None)).await.unwrap();
        let id = profile.id.to_hex();

        delete_profile(&state, &id).await.unwrap();
        assert!(matches!(get_profile(&state, &id).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete_profile(&state, &id).await, Err(AppError::NotFound(_))));
    }
}
