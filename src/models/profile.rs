use base64::Engine;
use mongodb::bson::{
    oid::ObjectId,
    spec::BinarySubtype,
    Binary, DateTime,
};
use serde::{Deserialize, Serialize};

/// Imagem embutida no documento do perfil
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub data: Binary,
    pub content_type: String,
}

impl ProfileImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            },
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }
}

/// Documento da collection "addusers"
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<ProfileImage>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Profile {
    pub fn new(user_name: String, email: String, mobile: String, image: Option<ProfileImage>) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            user_name,
            email,
            mobile,
            image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the allow-listed fields and bumps `updated_at`.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(user_name) = &update.user_name {
            self.user_name = user_name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(mobile) = &update.mobile {
            self.mobile = mobile.clone();
        }
        self.updated_at = DateTime::now();
    }
}

/// Fields a client may change through PATCH. Anything else is refused.
#[derive(Debug, Default, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.email.is_none() && self.mobile.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("userName", &self.user_name),
            ("email", &self.email),
            ("mobile", &self.mobile),
        ];
        for (field, value) in fields {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("{} cannot be empty", field));
            }
        }
        if self.is_empty() {
            return Err("No updatable fields provided".to_string());
        }
        Ok(())
    }
}

/// Campos do formulário multipart de criação
#[derive(Debug, Default)]
pub struct NewProfile {
    pub user_name: String,
    pub email: String,
    pub mobile: String,
    pub image: Option<ProfileImage>,
}

impl NewProfile {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("userName", &self.user_name),
            ("email", &self.email),
            ("mobile", &self.mobile),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    /// Base64 (standard alphabet, padded)
    pub data: String,
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<ImageResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let image = profile
            .image
            .filter(|image| !image.bytes().is_empty())
            .map(|image| ImageResponse {
                data: base64::engine::general_purpose::STANDARD.encode(image.bytes()),
                content_type: image.content_type,
            });

        Self {
            id: profile.id.to_hex(),
            user_name: profile.user_name,
            email: profile.email,
            mobile: profile.mobile,
            image,
            created_at: profile.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: profile.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
