use crate::error::{Result, SignpostError};
use crate::evaluator::Evaluator;
use crate::model::{Capability, Context, EvaluationResult, Policy};
use crate::repository::PolicyRepository;

/// Either a policy name (resolved via the repository at evaluation time)
/// or an already-constructed `Policy` value. A caller may freely mix both
/// in one query.
#[derive(Debug, Clone)]
pub enum PolicySource {
    Name(String),
    Value(Policy),
}

impl From<&str> for PolicySource {
    fn from(name: &str) -> Self {
        PolicySource::Name(name.to_string())
    }
}

impl From<String> for PolicySource {
    fn from(name: String) -> Self {
        PolicySource::Name(name)
    }
}

impl From<Policy> for PolicySource {
    fn from(policy: Policy) -> Self {
        PolicySource::Value(policy)
    }
}

/// The thin façade the core exposes to callers: resolves policy sources
/// through a repository and delegates to the evaluator.
pub struct PolicyManager<R: PolicyRepository> {
    repository: R,
    evaluator: Evaluator,
}

impl<R: PolicyRepository> PolicyManager<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            evaluator: Evaluator::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Start a fluent query. Both the policy-first flow (bind policies,
    /// then `.path(..).capability(..).evaluate()`) and the path-first flow
    /// (bind a path and context, then `.capabilities()` or
    /// `.any_capability_allowed()`) start here.
    pub fn query(&self) -> Evaluation<'_, R> {
        Evaluation {
            manager: self,
            policies: Vec::new(),
            path: None,
            capability: None,
            context: Context::new(),
        }
    }

    fn resolve(&self, sources: &[PolicySource]) -> Result<Vec<Policy>> {
        sources
            .iter()
            .map(|source| match source {
                PolicySource::Name(name) => self.repository.get(name),
                PolicySource::Value(policy) => Ok(policy.clone()),
            })
            .collect()
    }
}

/// Accumulates the fluent state for one evaluation query.
pub struct Evaluation<'a, R: PolicyRepository> {
    manager: &'a PolicyManager<R>,
    policies: Vec<PolicySource>,
    path: Option<String>,
    capability: Option<Capability>,
    context: Context,
}

impl<'a, R: PolicyRepository> Evaluation<'a, R> {
    pub fn policy(mut self, source: impl Into<PolicySource>) -> Self {
        self.policies.push(source.into());
        self
    }

    pub fn policies(mut self, sources: impl IntoIterator<Item = impl Into<PolicySource>>) -> Self {
        self.policies.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// policy-first / path-first convergence point: decide whether the
    /// bound capability is allowed at the bound path.
    pub fn evaluate(self) -> Result<EvaluationResult> {
        let path = self.require_path()?;
        let capability = self.capability.ok_or_else(|| SignpostError::UsageError {
            reason: "evaluate requires a capability to be specified".to_string(),
        })?;
        let policies = self.resolve_policies()?;
        self.manager
            .evaluator
            .evaluate(&policies, capability, &path, &self.context)
    }

    /// path-first: is any capability allowed at the bound path?
    pub fn any_capability_allowed(self) -> Result<bool> {
        Ok(!self.capabilities()?.is_empty())
    }

    /// path-first: enumerate the capabilities granted at the bound path.
    pub fn capabilities(self) -> Result<Vec<Capability>> {
        let path = self.require_path()?;
        let policies = self.resolve_policies()?;
        self.manager.evaluator.capabilities_at(&policies, &path, &self.context)
    }

    /// Static enumeration of every path pattern that could grant
    /// `capability`, independent of the bound path/context.
    pub fn accessible_paths(self, capability: Capability) -> Result<Vec<String>> {
        let policies = self.resolve_policies()?;
        Ok(self.manager.evaluator.list_accessible_paths(&policies, capability))
    }

    fn require_path(&self) -> Result<String> {
        self.path.clone().ok_or_else(|| SignpostError::UsageError {
            reason: "evaluation requires a path to be specified".to_string(),
        })
    }

    fn resolve_policies(&self) -> Result<Vec<Policy>> {
        if self.policies.is_empty() {
            return Err(SignpostError::UsageError {
                reason: "evaluation requires at least one bound policy".to_string(),
            });
        }
        self.manager.resolve(&self.policies)
    }
}
