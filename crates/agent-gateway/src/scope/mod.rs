//! Scope-based authorization.
//!
//! Scopes are opaque, case-sensitive capability labels such as `read` or
//! `write`. There are no wildcards and no hierarchy: `admin` does not
//! imply `write`. A policy is a conjunction: every required scope must
//! be granted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Set of scope labels. Ordered so that serialized tokens are stable.
pub type ScopeSet = BTreeSet<String>;

/// Build a [`ScopeSet`] from string-likes.
pub fn scope_set<I, S>(scopes: I) -> ScopeSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    scopes.into_iter().map(Into::into).collect()
}

/// Does `granted` cover every scope in `required`?
///
/// An empty `required` always authorizes.
pub fn authorize(granted: &ScopeSet, required: &ScopeSet) -> bool {
    required.is_subset(granted)
}

/// Scopes an operation requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePolicy {
    required: ScopeSet,
}

impl ScopePolicy {
    /// Policy with no requirements: authentication alone is enough.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Policy requiring every one of `scopes`.
    pub fn require<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: scope_set(scopes),
        }
    }

    pub fn required(&self) -> &ScopeSet {
        &self.required
    }

    pub fn is_satisfied_by(&self, granted: &ScopeSet) -> bool {
        authorize(granted, &self.required)
    }

    /// Required scopes absent from `granted`, in sorted order.
    pub fn missing<'a>(&'a self, granted: &'a ScopeSet) -> Vec<&'a str> {
        self.required
            .difference(granted)
            .map(String::as_str)
            .collect()
    }

    /// Check `granted` against the policy, naming the first missing scope.
    pub fn check(&self, granted: &ScopeSet) -> Result<()> {
        match self.missing(granted).first() {
            None => Ok(()),
            Some(missing) => Err(GatewayError::InsufficientScope {
                missing: (*missing).to_string(),
            }),
        }
    }
}
