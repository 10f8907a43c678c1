use std::sync::Arc;

use health_platform::{AuthorizationScope, HealthPlatform};

use crate::error::AuthorizationError;
use crate::observability;
use crate::state::{AuthorizationPhase, AuthorizationState, Notice, StateHandle};

/// Decides, once per app-ready event, whether health data may be read.
///
/// Each platform check is issued at most once per [`run`](Self::run); there is
/// no retry and no timeout beyond the platform's own.
#[derive(Clone)]
pub struct AuthorizationController {
    platform: Arc<dyn HealthPlatform>,
    scope: AuthorizationScope,
    state: StateHandle,
}

impl AuthorizationController {
    pub fn new(platform: Arc<dyn HealthPlatform>, state: StateHandle) -> Self {
        Self {
            platform,
            scope: AuthorizationScope::read_only(),
            state,
        }
    }

    /// Runs the flow to a terminal state and publishes it.
    pub async fn run(&self) -> AuthorizationState {
        self.state.update(|s| s.error = None);

        let outcome = match self.negotiate().await {
            Ok(freshly_granted) => {
                self.state.set_authorization(AuthorizationState::Authorized);
                self.state.notify(Notice::Authorized { freshly_granted });
                AuthorizationState::Authorized
            }
            Err(err) => self.fail(err).await,
        };

        tracing::info!(state = ?outcome, "authorization finished");
        observability::record_authorization(outcome);
        outcome
    }

    /// `Ok(true)` when the user just granted access, `Ok(false)` when it was
    /// already granted.
    async fn negotiate(&self) -> Result<bool, AuthorizationError> {
        self.enter(AuthorizationPhase::Availability);
        if !self
            .platform
            .is_available()
            .await
            .map_err(AuthorizationError::Platform)?
        {
            return Err(AuthorizationError::Unavailable);
        }

        self.enter(AuthorizationPhase::ExistingGrant);
        if self
            .platform
            .is_authorized(&self.scope)
            .await
            .map_err(AuthorizationError::Platform)?
        {
            return Ok(false);
        }

        self.enter(AuthorizationPhase::Requesting);
        if self
            .platform
            .request_authorization(&self.scope)
            .await
            .map_err(AuthorizationError::Platform)?
        {
            Ok(true)
        } else {
            Err(AuthorizationError::Denied)
        }
    }

    fn enter(&self, phase: AuthorizationPhase) {
        tracing::debug!(?phase, "authorization phase");
        self.state.set_authorization(AuthorizationState::Checking(phase));
    }

    async fn fail(&self, err: AuthorizationError) -> AuthorizationState {
        let message = err.to_string();
        let (terminal, notice) = match &err {
            AuthorizationError::Unavailable => {
                (AuthorizationState::Unavailable, Notice::Unavailable)
            }
            AuthorizationError::Denied => (AuthorizationState::Denied, Notice::AuthorizationDenied),
            AuthorizationError::Platform(source) => (
                AuthorizationState::Error,
                Notice::AuthorizationFailed {
                    detail: source.to_string(),
                },
            ),
        };

        tracing::warn!(error = %message, "health access not granted");
        self.state.update(|s| {
            s.set_authorization(terminal);
            s.error = Some(message);
        });
        self.state.notify(notice);

        if terminal == AuthorizationState::Error {
            self.remediate().await;
        }
        terminal
    }

    /// Best effort; the outcome is reported but never changes the state.
    async fn remediate(&self) {
        if !self.platform.supports_remediation() {
            return;
        }
        match self.platform.open_health_store().await {
            Ok(()) => self.state.notify(Notice::RemediationOpened),
            Err(e) => {
                tracing::warn!(error = %e, "could not open health store");
                self.state.notify(Notice::RemediationFailed {
                    detail: e.to_string(),
                });
            }
        }
    }
}
