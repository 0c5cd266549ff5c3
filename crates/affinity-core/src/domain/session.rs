use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an authenticated dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is browsing: decides where the recently viewed list lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// No identity; the list lives in client storage only.
    #[default]
    Anonymous,
    /// The server list is authoritative for this user.
    Authenticated(UserId),
}

impl Session {
    pub fn user(&self) -> Option<&UserId> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}
