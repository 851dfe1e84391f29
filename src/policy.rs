//! Stateless authorization rules.
//!
//! Two independent rule sets live here: the economic gate (which roles may
//! move money and how) and the history-visibility scope (whose ledger rows a
//! caller may list). Both are pure functions evaluated before any I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Caller role, resolved by the upstream identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Agent => "AGENT",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "AGENT" => Ok(Role::Agent),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Raised when a caller asks for ledger rows outside their visibility scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeViolation;

/// The economic gate and history scoping rules.
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Anyone may top up their own wallet, agents included: agents fund
    /// their float through deposit rather than cash-in on themselves.
    pub fn can_deposit(_role: Role) -> bool {
        true
    }

    /// Agents are not allowed to withdraw from their personal wallet.
    pub fn can_withdraw(role: Role) -> bool {
        role != Role::Agent
    }

    /// Agents are not allowed to send money peer-to-peer.
    pub fn can_send(role: Role) -> bool {
        role != Role::Agent
    }

    /// Only agents may move money into another user's wallet.
    pub fn can_cash_in(role: Role) -> bool {
        role == Role::Agent
    }

    /// Only agents may move money out of another user's wallet.
    pub fn can_cash_out(role: Role) -> bool {
        role == Role::Agent
    }

    /// Resolve the effective user filter for a history listing.
    ///
    /// Non-admin callers (USER and AGENT alike) only ever see rows where
    /// they are sender or receiver; an explicit `user_id` filter naming
    /// anyone else is rejected outright, regardless of any role claim
    /// carried elsewhere in the request. Admins may filter by any user id
    /// or none at all.
    ///
    /// Returns `Some(user_id)` to scope the query, `None` for unrestricted.
    pub fn scope_history(
        caller_id: Uuid,
        role: Role,
        requested: Option<Uuid>,
    ) -> Result<Option<Uuid>, ScopeViolation> {
        if role.is_admin() {
            return Ok(requested);
        }
        match requested {
            Some(other) if other != caller_id => Err(ScopeViolation),
            _ => Ok(Some(caller_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::SuperAdmin, Role::Admin, Role::User, Role::Agent] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("OPERATOR".parse::<Role>().is_err());
    }

    #[test]
    fn test_economic_gate_table() {
        // deposit: everyone
        for role in [Role::SuperAdmin, Role::Admin, Role::User, Role::Agent] {
            assert!(AuthorizationPolicy::can_deposit(role));
        }
        // withdraw/send: agent forbidden
        assert!(!AuthorizationPolicy::can_withdraw(Role::Agent));
        assert!(!AuthorizationPolicy::can_send(Role::Agent));
        assert!(AuthorizationPolicy::can_withdraw(Role::User));
        assert!(AuthorizationPolicy::can_send(Role::Admin));
        // cash-in/cash-out: agent only
        for role in [Role::SuperAdmin, Role::Admin, Role::User] {
            assert!(!AuthorizationPolicy::can_cash_in(role));
            assert!(!AuthorizationPolicy::can_cash_out(role));
        }
        assert!(AuthorizationPolicy::can_cash_in(Role::Agent));
        assert!(AuthorizationPolicy::can_cash_out(Role::Agent));
    }

    #[test]
    fn test_user_scoped_to_own_history() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::User, None),
            Ok(Some(me))
        );
        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::User, Some(me)),
            Ok(Some(me))
        );
        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::User, Some(other)),
            Err(ScopeViolation)
        );
        // agents get the same treatment as plain users
        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::Agent, Some(other)),
            Err(ScopeViolation)
        );
    }

    #[test]
    fn test_admin_history_unrestricted() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::Admin, None),
            Ok(None)
        );
        assert_eq!(
            AuthorizationPolicy::scope_history(me, Role::SuperAdmin, Some(other)),
            Ok(Some(other))
        );
    }
}
