use std::fmt;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    model::{Profile, User},
    unauthorized_error, DomainError,
};

/// The requesting user as vouched for by the identity provider. Only the user
/// id is trusted; everything else is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {}", self.user_id)
    }
}

impl From<&User> for Identity {
    fn from(value: &User) -> Self {
        Self { user_id: value.id }
    }
}

impl Identity {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    pub fn user(&self, conn: &Connection) -> Result<User, DomainError> {
        super::fetch(conn, self.user_id)
    }

    /// The requester's own profile
    pub fn profile(&self, conn: &Connection) -> Result<Profile, DomainError> {
        Profile::fetch_by_user_id(conn, self.user_id)
    }
}

/// Anything that belongs to exactly one profile
pub trait Owned {
    fn owner_profile_id(&self) -> i64;
}

/// Must be called before every mutation of an owned record
pub fn authorize_owner<T: Owned>(requester: &Profile, resource: &T, action: &str) -> Result<(), DomainError> {
    if requester.id == resource.owner_profile_id() {
        Ok(())
    } else {
        warn!(
            requester = requester.id,
            owner = resource.owner_profile_id(),
            action,
            "Rejected mutation by non-owner"
        );
        Err(unauthorized_error!("You don't have permission to {action}."))
    }
}
