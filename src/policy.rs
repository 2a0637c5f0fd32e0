//! Ownership and role rules for mutating a user record.

use crate::{
    auth::{AUTHENTICATION_REQUIRED, AuthUser},
    error::ApiError,
};

/// A mutation a principal wants to perform on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update { changes_role: bool },
    Delete,
}

/// Why `can_act` refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    NotOwner(Action),
    RoleChangeRequiresAdmin,
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => AUTHENTICATION_REQUIRED,
            Denial::NotOwner(Action::Delete) => "You can only delete your own account",
            Denial::NotOwner(Action::Update { .. }) => "You can only update your own information",
            Denial::RoleChangeRequiresAdmin => "Only admins can change user roles",
        }
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => ApiError::Unauthorized(denial.reason()),
            _ => ApiError::Forbidden(denial.reason()),
        }
    }
}

/// can_act
///
/// Checks, in this order: a principal is present, it targets its own record or is an
/// admin, and a role change (update only) comes from an admin. The first failing rule
/// decides the denial.
pub fn can_act(principal: Option<&AuthUser>, target_id: i64, action: Action) -> Result<(), Denial> {
    let principal = principal.ok_or(Denial::Unauthenticated)?;

    if principal.id != target_id && !principal.is_admin() {
        return Err(Denial::NotOwner(action));
    }

    if let Action::Update { changes_role: true } = action {
        if !principal.is_admin() {
            return Err(Denial::RoleChangeRequiresAdmin);
        }
    }

    Ok(())
}
