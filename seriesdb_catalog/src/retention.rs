//! Retention policies and the per-database policy table.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{CatalogError, Result};

/// Floor enforced on retention policy durations.
///
/// A duration of zero is exempt: it means points are retained indefinitely.
pub const MIN_RETENTION_POLICY_DURATION: Duration = Duration::from_secs(60 * 60);

/// A named rule for how long a database keeps data and how widely it is
/// replicated. At most one policy per database carries the default flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub name: Arc<str>,
    pub duration: Duration,
    pub replica_n: u64,
    pub default: bool,
}

/// Field updates applied by `ALTER RETENTION POLICY`.
///
/// `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionPolicyUpdate {
    pub duration: Option<Duration>,
    pub replica_n: Option<u64>,
    pub default: Option<bool>,
}

/// The retention policies of a single database, in creation order.
///
/// Creation order is observable: `SHOW RETENTION POLICIES` lists policies
/// in the order they were created, and promoting a policy to default does
/// not move it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicyTable {
    policies: IndexMap<Arc<str>, RetentionPolicy>,
}

impl RetentionPolicyTable {
    /// Create a new policy. If `default` is set, the previously-default
    /// policy loses the flag in the same mutation.
    pub fn create(
        &mut self,
        name: &str,
        duration: Duration,
        replica_n: u64,
        default: bool,
    ) -> Result<()> {
        if self.policies.contains_key(name) {
            return Err(CatalogError::RetentionPolicyExists);
        }
        check_duration(duration)?;
        if default {
            self.clear_default();
        }
        let name: Arc<str> = Arc::from(name);
        self.policies.insert(
            Arc::clone(&name),
            RetentionPolicy {
                name,
                duration,
                replica_n,
                default,
            },
        );
        Ok(())
    }

    /// Apply the supplied fields to an existing policy. Promoting to
    /// default demotes the prior default atomically with the rest of the
    /// update.
    pub fn alter(&mut self, name: &str, update: RetentionPolicyUpdate) -> Result<()> {
        if !self.policies.contains_key(name) {
            return Err(CatalogError::RetentionPolicyNotFound);
        }
        if let Some(duration) = update.duration {
            check_duration(duration)?;
        }
        if update.default == Some(true) {
            self.clear_default();
        }
        let policy = self
            .policies
            .get_mut(name)
            .expect("policy existence checked above");
        if let Some(duration) = update.duration {
            policy.duration = duration;
        }
        if let Some(replica_n) = update.replica_n {
            policy.replica_n = replica_n;
        }
        if let Some(default) = update.default {
            policy.default = default;
        }
        Ok(())
    }

    /// Remove a policy. The current default policy cannot be dropped, even
    /// when it is the only policy left; it must be demoted first.
    pub fn drop(&mut self, name: &str) -> Result<RetentionPolicy> {
        let policy = self
            .policies
            .get(name)
            .ok_or(CatalogError::RetentionPolicyNotFound)?;
        if policy.default {
            return Err(CatalogError::RetentionPolicyIsDefault);
        }
        Ok(self
            .policies
            .shift_remove(name)
            .expect("policy existence checked above"))
    }

    pub fn get(&self, name: &str) -> Option<&RetentionPolicy> {
        self.policies.get(name)
    }

    /// The policy currently flagged as default, if any.
    pub fn default_policy(&self) -> Option<&RetentionPolicy> {
        self.policies.values().find(|policy| policy.default)
    }

    /// Policies in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &RetentionPolicy> {
        self.policies.values()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    fn clear_default(&mut self) {
        for policy in self.policies.values_mut() {
            policy.default = false;
        }
    }
}

fn check_duration(duration: Duration) -> Result<()> {
    if !duration.is_zero() && duration < MIN_RETENTION_POLICY_DURATION {
        return Err(CatalogError::RetentionPolicyDurationTooShort);
    }
    Ok(())
}
