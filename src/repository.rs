use std::collections::HashMap;

use crate::error::{Result, SignpostError};
use crate::model::Policy;

/// Policy lookup contract consumed by the surrounding manager, not by the
/// evaluator itself. File-backed, SQL-backed, chained, and caching
/// implementations are all valid but outside this crate's scope; only
/// `InMemoryPolicyRepository` ships here.
pub trait PolicyRepository {
    fn get(&self, name: &str) -> Result<Policy>;
    fn has(&self, name: &str) -> bool;
    fn all(&self) -> HashMap<String, Policy>;

    /// Batch lookup. Fails with `MultiplePoliciesNotFound` listing every
    /// missing name if any is absent. An empty input yields an empty
    /// result with no I/O.
    fn get_many(&self, names: &[String]) -> Result<HashMap<String, Policy>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let mut missing = Vec::new();
        let mut found = HashMap::new();
        for name in names {
            match self.get(name) {
                Ok(policy) => {
                    found.insert(name.clone(), policy);
                }
                Err(SignpostError::PolicyNotFound { .. }) => missing.push(name.clone()),
                Err(other) => return Err(other),
            }
        }

        if !missing.is_empty() {
            return Err(SignpostError::MultiplePoliciesNotFound { names: missing });
        }
        Ok(found)
    }
}

/// Holds policies in a plain `HashMap`, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPolicyRepository {
    policies: HashMap<String, Policy>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.insert(policy.name().to_string(), policy);
        self
    }

    pub fn with_policies(mut self, policies: impl IntoIterator<Item = Policy>) -> Self {
        for policy in policies {
            self.policies.insert(policy.name().to_string(), policy);
        }
        self
    }

    pub fn insert(&mut self, policy: Policy) {
        self.policies.insert(policy.name().to_string(), policy);
    }
}

impl PolicyRepository for InMemoryPolicyRepository {
    fn get(&self, name: &str) -> Result<Policy> {
        self.policies
            .get(name)
            .cloned()
            .ok_or_else(|| SignpostError::PolicyNotFound {
                name: name.to_string(),
            })
    }

    fn has(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    fn all(&self) -> HashMap<String, Policy> {
        self.policies.clone()
    }
}
