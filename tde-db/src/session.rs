use crate::error::{Result, StoreError};

/// Who is using the toolkit right now. Identity comes from outside (an
/// auth backend or configuration); this only answers "is someone logged in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { user_id: None }
    }

    pub fn logged_in(user_id: impl Into<String>) -> Self {
        Session {
            user_id: Some(user_id.into()),
        }
    }

    /// A blank identity counts as logged out.
    pub fn from_user_id(user_id: Option<String>) -> Self {
        Session {
            user_id: user_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// The current user's id, or [`StoreError::AuthenticationRequired`].
    pub fn current_user(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .ok_or(StoreError::AuthenticationRequired)
    }
}
