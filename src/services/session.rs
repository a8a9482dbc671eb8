use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::user::{LoginResponse, ProfileUpdate, SignupRequest, SignupResponse, User};

/// Backend marker for a Google account that authenticated fine but has no
/// phone number on file yet; callers redirect to profile completion.
const PHONE_REQUIRED_MARKER: &str = "Phone number is required";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Google sign-in succeeded upstream but the account needs profile
    /// completion before a session can be established.
    #[error("profile incomplete: phone number required")]
    ProfileIncomplete,
    #[error("a phone number is required")]
    PhoneNumberRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owns authentication state and its transitions:
/// anonymous -> login/google_login -> authenticated -> logout/refresh-failure -> anonymous.
pub struct SessionService {
    api: Arc<ApiClient>,
    user: RwLock<Option<User>>,
}

impl SessionService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        SessionService {
            api,
            user: RwLock::new(None),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.tokens().is_logged_in()
    }

    /// Credential login. The backend takes OAuth2-style form fields, with
    /// the email in `username`.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let resp: LoginResponse = self
            .api
            .post_form_noauth("/auth/login", &[("username", email), ("password", password)])
            .await
            .map_err(|err| match err {
                ApiError::Unauthorized => SessionError::InvalidCredentials,
                other => SessionError::Api(other),
            })?;
        self.establish(resp)
    }

    /// Creates an unverified account. No session is established; the caller
    /// verifies via OTP and then logs in explicitly.
    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, SessionError> {
        let resp = self.api.post_json_noauth("/auth/signup", request).await?;
        Ok(resp)
    }

    /// Exchanges the emailed OTP for verified status. Deliberately does not
    /// log the user in afterwards.
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<(), SessionError> {
        let _: serde_json::Value = self
            .api
            .post_json_noauth(
                "/auth/verify-email-otp",
                &json!({ "email": email, "otp": otp }),
            )
            .await?;
        Ok(())
    }

    /// Exchanges a Google OAuth credential for a session. A 400 carrying the
    /// phone-number marker is re-thrown as `ProfileIncomplete` without
    /// touching any existing session state.
    pub async fn google_login(&self, credential: &str) -> Result<User, SessionError> {
        let result: Result<LoginResponse, ApiError> = self
            .api
            .post_json_noauth("/auth/google", &json!({ "credential": credential }))
            .await;
        match result {
            Ok(resp) => self.establish(resp),
            Err(err) if is_phone_required(&err) => Err(SessionError::ProfileIncomplete),
            Err(err) => Err(SessionError::Api(err)),
        }
    }

    /// Explicit token rotation. On failure the client has already cleared
    /// the token pair; this drops the cached user to match.
    pub async fn refresh_token(&self) -> Result<String, SessionError> {
        match self.api.force_refresh().await {
            Ok(access) => Ok(access),
            Err(err) => {
                *self.user.write().unwrap() = None;
                Err(SessionError::Api(err))
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let user: User = self
            .api
            .patch_json("/users/me", update)
            .await
            .map_err(|err| {
                if is_phone_required(&err) {
                    SessionError::PhoneNumberRequired
                } else {
                    SessionError::Api(err)
                }
            })?;
        *self.user.write().unwrap() = Some(user.clone());
        Ok(user)
    }

    pub async fn me(&self) -> Result<User, SessionError> {
        let user: User = self.api.get_json("/users/me").await?;
        *self.user.write().unwrap() = Some(user.clone());
        Ok(user)
    }

    /// Best-effort server-side invalidation, then unconditional local
    /// clearing. Safe to call when already logged out.
    pub async fn logout(&self) {
        if self.is_logged_in() {
            self.api.post_best_effort("/auth/logout").await;
        } else {
            debug!("logout requested without an active session");
        }
        self.api.tokens().clear();
        *self.user.write().unwrap() = None;
    }

    fn establish(&self, resp: LoginResponse) -> Result<User, SessionError> {
        self.api
            .tokens()
            .store_session(&resp.access_token, &resp.refresh_token);
        *self.user.write().unwrap() = Some(resp.user.clone());
        Ok(resp.user)
    }
}

fn is_phone_required(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Status { message, .. } if message.contains(PHONE_REQUIRED_MARKER)
    )
}
