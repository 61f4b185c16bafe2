//! Session state: login, registration, and the persisted token/user pair.

use std::sync::{Arc, RwLock};

use tracing::{info, instrument, warn};

use crate::api::{ApiClient, RegisterInput, RegisterOutcome};
use crate::errors::StorefrontError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{Role, User};
use crate::storage::{keys, SnapshotStorage, SnapshotStorageExt};

pub struct SessionStore {
    api: Arc<ApiClient>,
    storage: Arc<dyn SnapshotStorage>,
    events: EventBus,
    user: RwLock<Option<User>>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, storage: Arc<dyn SnapshotStorage>, events: EventBus) -> Self {
        Self {
            api,
            storage,
            events,
            user: RwLock::new(None),
        }
    }

    /// Reinstalls a persisted session, if any. Unreadable snapshots are
    /// treated as a logged-out state.
    pub fn restore(&self) {
        let token = match self.storage.get(keys::TOKEN) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "stored token unreadable");
                None
            }
        };
        let user = match self.storage.get_json::<User>(keys::USER) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "stored user unreadable");
                None
            }
        };

        if let (Some(token), Some(user)) = (token, user) {
            info!(role = %user.role, "restored session");
            self.api.set_token(Some(token));
            *self.user.write().expect("session lock poisoned") = Some(user);
        }
    }

    /// Authenticates against the server with an expected role. The server's
    /// answer is authoritative: a role mismatch fails the login rather than
    /// silently switching dashboards.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, StorefrontError> {
        let response = self.api.login(email, password, role).await?;

        if response.token.is_empty() {
            return Err(StorefrontError::AuthError(
                "Invalid credentials".to_string(),
            ));
        }

        let account_role = response.role.unwrap_or(response.user.role);
        if account_role != role {
            return Err(StorefrontError::AuthError(format!(
                "Selected role \"{role}\" does not match account role \"{account_role}\""
            )));
        }

        let mut user = response.user;
        user.role = account_role;

        if let Err(e) = self.storage.set(keys::TOKEN, &response.token) {
            warn!(error = %e, "failed to persist token; session will not survive reload");
        }
        if let Err(e) = self.storage.set_json(keys::USER, &user) {
            warn!(error = %e, "failed to persist user; session will not survive reload");
        }

        self.api.set_token(Some(response.token));
        *self.user.write().expect("session lock poisoned") = Some(user.clone());

        info!(role = %account_role, "login succeeded");
        self.events
            .send_or_log(StoreEvent::SessionStarted { role: account_role });
        Ok(user)
    }

    /// Creates an account. A `success: false` answer surfaces the server's
    /// reason; the caller logs in separately afterwards.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: &RegisterInput) -> Result<User, StorefrontError> {
        match self.api.register(input).await? {
            RegisterOutcome::Created(user) => Ok(user),
            RegisterOutcome::Rejected(message) => Err(StorefrontError::AuthError(message)),
        }
    }

    /// Drops the session locally. No server call is involved; the token is
    /// simply forgotten.
    pub fn logout(&self) {
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                warn!(error = %e, key, "failed to remove session key");
            }
        }
        self.api.set_token(None);
        *self.user.write().expect("session lock poisoned") = None;
        self.events.send_or_log(StoreEvent::SessionEnded);
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().expect("session lock poisoned").clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.has_token()
    }
}
