//! User roles and the acting user passed to engine operations.

use crate::error::CoreError;
use crate::types::DbId;

string_enum! {
    /// Ordered from least to most privileged.
    Role {
        ReadOnly => "READ_ONLY",
        Edit => "EDIT",
        Vote => "VOTE",
        Admin => "ADMIN",
    }
}

impl Role {
    /// Whether this role includes the privileges of `required`.
    pub fn includes(&self, required: Role) -> bool {
        *self >= required
    }
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require(&self, role: Role) -> Result<(), CoreError> {
        if self.role.includes(role) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "User {} with role {} requires {}",
                self.user_id, self.role, role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_includes_every_role() {
        for role in Role::ALL {
            assert!(Role::Admin.includes(*role));
        }
    }

    #[test]
    fn editor_cannot_vote() {
        let actor = Actor::new(1, Role::Edit);
        assert!(actor.require(Role::Edit).is_ok());
        assert!(actor.require(Role::Vote).is_err());
    }
}
