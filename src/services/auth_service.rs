use std::sync::Arc;

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::services::api::{Api, AuthResponse};
use crate::services::storage::{LocalStore, KEY_AUTH_TOKEN, KEY_FIRST_TIME_USER};

// Landing page that hosts the Google sign-in flow and redirects back into
// the app with a code + echoed state.
const LANDING_PAGE_URL: &str = "https://uniguru.in";

// Deep link scheme for the app
const CALLBACK_SCHEME: &str = "uniguru";

/// Auth State: the current user identity and login flag.
///
/// Successful auth calls persist the bearer token; everything else about the
/// identity lives in memory only and dies with the session.
pub struct AuthService {
    api: Arc<dyn Api>,
    store: Arc<LocalStore>,
    user: Option<User>,
    pending_oauth_state: Option<String>,
}

impl AuthService {
    pub fn new(api: Arc<dyn Api>, store: Arc<LocalStore>) -> Self {
        Self {
            api,
            store,
            user: None,
            pending_oauth_state: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Silent startup probe. Restores the session when the persisted token
    /// is still good; any failure leaves the container logged out. A 401
    /// already dropped the token inside the client, so only other failures
    /// are worth a log line — none of them may block startup.
    pub async fn check_status(&mut self) -> Option<User> {
        self.store.get_or_default::<String>(KEY_AUTH_TOKEN)?;

        match self.api.auth_status().await {
            Ok(response) => Some(self.adopt(response)),
            Err(err) => {
                if !err.is_unauthorized() {
                    tracing::warn!(error = %err, "auth status check failed");
                }
                None
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        let response = self.api.login(email, password).await?;
        Ok(self.adopt(response))
    }

    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Name, email and password are required"));
        }

        let response = self.api.signup(name, email, password).await?;
        // A fresh account gets the onboarding tour.
        self.store.set_quiet(KEY_FIRST_TIME_USER, &true);
        Ok(self.adopt(response))
    }

    /// Sign in with a Google ID token obtained by the shell.
    pub async fn google_login(&mut self, id_token: &str) -> Result<User, ApiError> {
        if id_token.trim().is_empty() {
            return Err(ApiError::validation("Missing Google credential"));
        }

        let response = self.api.google_token_login(id_token).await?;
        Ok(self.adopt(response))
    }

    /// Exchange the code delivered on the OAuth callback, verifying the CSRF
    /// state issued by `google_auth_url`.
    pub async fn google_exchange(&mut self, code: &str, state: &str) -> Result<User, ApiError> {
        match self.pending_oauth_state.take() {
            Some(expected) if expected == state => {}
            _ => return Err(ApiError::validation("Invalid state parameter")),
        }

        let response = self.api.google_exchange(code).await?;
        Ok(self.adopt(response))
    }

    /// Build the sign-in URL for the shell to open in a browser, remembering
    /// the CSRF state for the callback.
    pub fn google_auth_url(&mut self) -> String {
        let state = Uuid::new_v4().to_string();
        let redirect_uri = format!("{}://auth/callback", CALLBACK_SCHEME);

        let url = format!(
            "{}/auth.html?app_redirect={}&state={}",
            LANDING_PAGE_URL,
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(&state)
        );
        self.pending_oauth_state = Some(state);
        url
    }

    /// Sign out: tell the server (failure is not fatal), then clear the
    /// identity and the stored token. Tearing down guru/chat state is the
    /// composition root's job.
    pub async fn logout(&mut self) {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "logout request failed");
        }
        self.user = None;
        self.store.remove_quiet(KEY_AUTH_TOKEN);
    }

    pub fn first_time_user(&self) -> bool {
        self.store
            .get_or_default::<bool>(KEY_FIRST_TIME_USER)
            .unwrap_or(false)
    }

    pub fn mark_onboarding_seen(&self) {
        self.store.set_quiet(KEY_FIRST_TIME_USER, &false);
    }

    fn adopt(&mut self, response: AuthResponse) -> User {
        self.store.set_quiet(KEY_AUTH_TOKEN, &response.token);
        let user = response.user();
        self.user = Some(user.clone());
        user
    }
}
