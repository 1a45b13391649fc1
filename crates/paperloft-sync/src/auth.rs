//! Email/password accounts against an identity-toolkit style REST endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use paperloft_core::Error;

/// Default identity endpoint.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication failures with user-facing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("reCAPTCHA verification failed. Please try again.")]
    MissingCaptcha,

    #[error("Password must be at least 6 characters long.")]
    PasswordTooShort,

    #[error("No account found with this email. Please sign up.")]
    UserNotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("This account has been disabled.")]
    UserDisabled,

    #[error("Too many failed attempts. Please try again later.")]
    TooManyRequests,

    #[error("An account already exists with this email. Please sign in.")]
    EmailAlreadyInUse,

    #[error("Password is too weak. Please use a stronger password.")]
    WeakPassword,

    #[error("Identity provider is not configured")]
    NotConfigured,

    /// Unmapped provider message, shown as-is.
    #[error("{0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl AuthError {
    /// Map a provider error message such as `EMAIL_NOT_FOUND` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_provider_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::WrongPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            _ => Self::Provider(message.to_string()),
        }
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Network(msg) => Error::Request(msg),
            AuthError::NotConfigured => Error::Config(e.to_string()),
            other => Error::Unauthorized(other.to_string()),
        }
    }
}

/// A signed-in account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(skip_serializing, default)]
    pub id_token: String,
    #[serde(skip_serializing, default)]
    pub refresh_token: String,
}

impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// Identity endpoint configuration.
#[derive(Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    /// Web API key passed as `?key=`.
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_IDENTITY_URL.to_string(),
            api_key: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("IDENTITY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string()),
            api_key: std::env::var("IDENTITY_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout_seconds: std::env::var("IDENTITY_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    id_token: String,
    #[serde(default)]
    refresh_token: String,
}

#[derive(Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorBody,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for password sign-in and sign-up.
pub struct IdentityClient {
    client: Client,
    config: IdentityConfig,
}

impl IdentityClient {
    pub fn new(config: IdentityConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AuthError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(IdentityConfig::from_env())
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Sign in an existing account.
    #[instrument(skip(self, password, captcha_token), fields(subsystem = "sync", component = "auth", op = "sign_in"))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        require_captcha(captcha_token)?;
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    /// Create an account and sign it in.
    #[instrument(skip(self, password, captcha_token), fields(subsystem = "sync", component = "auth", op = "sign_up"))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        require_captcha(captcha_token)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        self.password_call("accounts:signUp", email, password).await
    }

    async fn password_call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let api_key = self.config.api_key.as_deref().ok_or(AuthError::NotConfigured)?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), action);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&PasswordRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            let error = AuthError::from_provider_message(&message);
            warn!(status = status.as_u16(), provider_message = %message, "Authentication rejected");
            return Err(error);
        }

        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Unreadable identity response: {}", e)))?;

        info!(uid = %body.local_id, "Authenticated");
        Ok(AuthUser {
            uid: body.local_id,
            email: if body.email.is_empty() {
                email.trim().to_string()
            } else {
                body.email
            },
            display_name: body.display_name,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }
}

fn require_captcha(token: Option<&str>) -> Result<(), AuthError> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(()),
        _ => Err(AuthError::MissingCaptcha),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes_map_to_messages() {
        assert_eq!(
            AuthError::from_provider_message("EMAIL_NOT_FOUND").to_string(),
            "No account found with this email. Please sign up."
        );
        assert_eq!(
            AuthError::from_provider_message("INVALID_PASSWORD"),
            AuthError::WrongPassword
        );
        assert_eq!(
            AuthError::from_provider_message("EMAIL_EXISTS").to_string(),
            "An account already exists with this email. Please sign in."
        );
        assert_eq!(
            AuthError::from_provider_message(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            AuthError::WeakPassword
        );
        assert_eq!(
            AuthError::from_provider_message("TOO_MANY_ATTEMPTS_TRY_LATER").to_string(),
            "Too many failed attempts. Please try again later."
        );
    }

    #[test]
    fn test_unknown_code_keeps_raw_message() {
        let err = AuthError::from_provider_message("OPERATION_NOT_ALLOWED");
        assert_eq!(err.to_string(), "OPERATION_NOT_ALLOWED");
    }

    #[test]
    fn test_into_core_error() {
        assert!(matches!(
            Error::from(AuthError::UserDisabled),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            Error::from(AuthError::Network("reset".to_string())),
            Error::Request(_)
        ));
    }

    #[test]
    fn test_require_captcha() {
        assert_eq!(require_captcha(None), Err(AuthError::MissingCaptcha));
        assert_eq!(require_captcha(Some("  ")), Err(AuthError::MissingCaptcha));
        assert!(require_captcha(Some("token")).is_ok());
    }

    #[test]
    fn test_user_debug_redacts_tokens() {
        let user = AuthUser {
            uid: "u1".to_string(),
            email: "a@b.c".to_string(),
            display_name: String::new(),
            id_token: "secret-id".to_string(),
            refresh_token: "secret-refresh".to_string(),
        };
        let debug = format!("{:?}", user);
        assert!(!debug.contains("secret"));
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("idToken").is_none());
    }

    #[tokio::test]
    async fn test_short_password_rejected_before_request() {
        let client = IdentityClient::new(IdentityConfig::default().with_api_key("k")).unwrap();
        let err = client.sign_up("a@b.c", "12345", Some("t")).await.unwrap_err();
        assert_eq!(err, AuthError::PasswordTooShort);
    }

    #[test]
    fn test_new_keeps_configured_timeout() {
        let config = IdentityConfig {
            timeout_seconds: 3,
            ..IdentityConfig::default()
        };
        let client = IdentityClient::new(config).unwrap();
        assert_eq!(client.config().timeout_seconds, 3);
    }
}
