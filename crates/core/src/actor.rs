//! Acting identities and per-page edit scopes.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Well-known role name constants.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";

/// The currently-acting identity, supplied by the host application.
///
/// An absent actor (unauthenticated context) is a valid state everywhere in
/// this crate; writes record an author id of 0 in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn new(id: DbId, roles: &[&str]) -> Self {
        Actor {
            id,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Who may edit a page, declared per node and stored with the row.
///
/// `Inherit` defers to the parent; every other variant is an explicit grant
/// evaluated where it is declared. An ancestor's permissive grant never
/// overrides a descendant's explicit restriction, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditScope {
    /// Defer to the parent page. At the root, the default policy applies.
    #[default]
    Inherit,
    /// No restriction.
    Anyone,
    /// Restricted to actors holding at least one of these roles.
    OnlyRoles { roles: Vec<String> },
    /// Restricted to these specific actor ids.
    OnlyUsers { ids: Vec<DbId> },
}

impl EditScope {
    pub fn only_roles(roles: &[&str]) -> Self {
        EditScope::OnlyRoles {
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn only_users(ids: &[DbId]) -> Self {
        EditScope::OnlyUsers { ids: ids.to_vec() }
    }

    /// Evaluate this scope against an actor.
    ///
    /// Returns `None` for `Inherit` (the decision lives further up the
    /// tree), `Some(decision)` for every explicit grant.
    pub fn allows(&self, actor: Option<&Actor>) -> Option<bool> {
        match self {
            EditScope::Inherit => None,
            EditScope::Anyone => Some(true),
            EditScope::OnlyRoles { roles } => Some(
                actor.is_some_and(|a| roles.iter().any(|r| a.has_role(r))),
            ),
            EditScope::OnlyUsers { ids } => Some(actor.is_some_and(|a| ids.contains(&a.id))),
        }
    }
}
