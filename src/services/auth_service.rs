use crate::{
    database::with_timeout,
    models::{Account, LoginRequest, SignupRequest},
    state::AppState,
    utils::{AppError, LoginRejection, DUPLICATE_EMAIL_MESSAGE},
};

/// Hook around the login flow. The shipped policy admits every attempt;
/// throttling or lockout can be plugged in here without touching verify/issue.
pub trait LoginPolicy: Send + Sync {
    fn admit(&self, email: &str) -> Result<(), AppError>;

    fn record_failure(&self, _email: &str, _reason: LoginRejection) {}

    fn record_success(&self, _email: &str) {}
}

/// No throttling: every attempt is independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

impl LoginPolicy for Unthrottled {
    fn admit(&self, _email: &str) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub account_id: String,
    pub expires_at: usize,
}

/// Creates the account if the email is free. The password is hashed before the write.
pub async fn signup(state: &AppState, request: SignupRequest) -> Result<Account, AppError> {
    request.validate().map_err(AppError::Validation)?;

    let existing = with_timeout(
        state.storage_timeout,
        state.accounts.find_by_email(&request.email),
    )
    .await?;
    if existing.is_some() {
        return Err(AppError::Validation(DUPLICATE_EMAIL_MESSAGE.to_string()));
    }

    let mut account = Account::new(request);
    state.credentials.seal(&mut account).await?;

    // The unique index still decides if another signup slipped in meanwhile.
    with_timeout(state.storage_timeout, state.accounts.insert(&account)).await?;

    log::info!("✅ Account created: {} ({})", account.email, account.id.to_hex());
    Ok(account)
}

/// Start → Lookup → Verify → Issue, rejecting at lookup or verify.
pub async fn login(state: &AppState, request: &LoginRequest) -> Result<LoginSuccess, AppError> {
    state.login_policy.admit(&request.email)?;

    let lookup = with_timeout(
        state.storage_timeout,
        state.accounts.find_by_email(&request.email),
    )
    .await?;

    let account = match lookup {
        Some(account) => account,
        None => return Err(reject(state, &request.email, LoginRejection::UserNotFound)),
    };

    let matches = state
        .credentials
        .verify(&request.password, &account.password)
        .await?;
    if !matches {
        return Err(reject(state, &request.email, LoginRejection::InvalidCredentials));
    }

    let issued = state.credentials.issue_token(&account.id)?;
    state.login_policy.record_success(&request.email);

    Ok(LoginSuccess {
        token: issued.token,
        account_id: account.id.to_hex(),
        expires_at: issued.expires_at,
    })
}

fn reject(state: &AppState, email: &str, reason: LoginRejection) -> AppError {
    state.login_policy.record_failure(email, reason);
    AppError::Rejected(reason)
}
