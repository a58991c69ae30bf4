use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Gender {
    Male,
    Female,
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum City {
    Mumbai,
    Pune,
    Ahmedabad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum State {
    Gujarat,
    Maharashtra,
    Karnataka,
}

/// Documento da collection "signupusers"
///
/// `password` only ever holds a bcrypt hash once the account has been sealed.
/// A cleartext password waits in `pending_password` until then and is never
/// serialized.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub password: String,
    pub gender: Gender,
    #[serde(default)]
    pub hear_about: Vec<String>,
    pub city: City,
    pub state: State,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    #[serde(skip)]
    pending_password: Option<String>,
}

impl Account {
    pub fn new(request: SignupRequest) -> Self {
        let now = DateTime::now();
        let mut account = Self {
            id: ObjectId::new(),
            email: request.email,
            name: request.name,
            phone: request.phone,
            password: String::new(),
            gender: request.gender,
            hear_about: request.hear_about,
            city: request.city,
            state: request.state,
            created_at: now,
            updated_at: now,
            pending_password: None,
        };
        account.set_password(request.password);
        account
    }

    /// Replaces the password; it gets hashed on the next seal.
    pub fn set_password(&mut self, cleartext: impl Into<String>) {
        self.pending_password = Some(cleartext.into());
    }

    #[cfg(test)]
    pub fn password_modified(&self) -> bool {
        self.pending_password.is_some()
    }

    pub(crate) fn take_pending_password(&mut self) -> Option<String> {
        self.pending_password.take()
    }

    pub fn touch(&mut self) {
        self.updated_at = DateTime::now();
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub password: String,
    pub gender: Gender,
    pub hear_about: Vec<String>,
    pub city: City,
    pub state: State,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("email", &self.email),
            ("name", &self.name),
            ("phone", &self.phone),
            ("password", &self.password),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", field));
            }
        }
        Ok(())
    }
}

/// Account as returned over HTTP. The password hash stays server-side.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub gender: Gender,
    pub hear_about: Vec<String>,
    pub city: City,
    pub state: State,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_hex(),
            email: account.email,
            name: account.name,
            phone: account.phone,
            gender: account.gender,
            hear_about: account.hear_about,
            city: account.city,
            state: account.state,
            created_at: account.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: account.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[cfg(test)]
pub(crate) fn sample_signup(email: &str, password: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        name: "Asha".to_string(),
        phone: "9876543210".to_string(),
        password: password.to_string(),
        gender: Gender::Female,
        hear_about: vec!["friends".to_string()],
        city: City::Pune,
        state: State::Maharashtra,
    }
}
