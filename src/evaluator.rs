use tracing::{debug, info};

use crate::condition::ConditionEvaluator;
use crate::error::Result;
use crate::model::{Capability, Context, Effect, EvaluationResult, Policy, Rule};
use crate::path::PathMatcher;
use crate::specificity::SpecificityCalculator;

struct Candidate<'a> {
    rule: &'a Rule,
    policy: &'a Policy,
    specificity: i64,
}

/// Combines path/condition/capability matching across a set of policies
/// into a single decision, and answers the two enumeration queries.
///
/// Stateless and thread-safe: any number of callers may invoke its
/// operations concurrently on the same or different policy lists.
pub struct Evaluator {
    specificity: SpecificityCalculator,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            specificity: SpecificityCalculator,
        }
    }

    pub fn specificity_calculator(&self) -> &SpecificityCalculator {
        &self.specificity
    }

    /// Decide whether `capability` is allowed at `path` under `context`,
    /// given the ordered policies in `policies`.
    pub fn evaluate(
        &self,
        policies: &[Policy],
        capability: Capability,
        path: &str,
        context: &Context,
    ) -> Result<EvaluationResult> {
        let mut candidates: Vec<Candidate> = Vec::new();

        for policy in policies {
            for rule in policy.rules() {
                if !PathMatcher::matches(rule.path(), path, context)? {
                    debug!(path, rule = rule.path(), "rule skipped: path does not match");
                    continue;
                }
                if !ConditionEvaluator::evaluate_all(rule.conditions(), context) {
                    debug!(path, rule = rule.path(), "rule skipped: condition not satisfied");
                    continue;
                }

                let eligible = match rule.effect() {
                    Effect::Deny => true,
                    Effect::Allow => rule.grants(capability),
                };
                if eligible {
                    candidates.push(Candidate {
                        rule,
                        policy,
                        specificity: SpecificityCalculator::specificity(rule.path()),
                    });
                }
            }
        }

        let evaluated: Vec<Policy> = policies.to_vec();

        if candidates.is_empty() {
            info!(path, ?capability, "no matching rule: implicit deny");
            return Ok(EvaluationResult::implicit_deny(
                "No matching rule found".to_string(),
                evaluated,
            ));
        }

        // Stable sort, descending specificity: stability preserves
        // rule-insertion order as the tiebreaker.
        candidates.sort_by(|a, b| b.specificity.cmp(&a.specificity));

        if let Some(deny) = candidates.iter().find(|c| c.rule.effect() == Effect::Deny) {
            info!(path, rule = deny.rule.path(), "explicit deny");
            return Ok(EvaluationResult::explicit_deny(
                deny.rule.clone(),
                deny.policy.clone(),
                format!("Denied by rule matching {}", deny.rule.path()),
                evaluated,
            ));
        }

        let winner = &candidates[0];
        info!(path, rule = winner.rule.path(), "allowed");
        Ok(EvaluationResult::allow(
            winner.rule.clone(),
            winner.policy.clone(),
            format!("Allowed by rule matching {}", winner.rule.path()),
            evaluated,
        ))
    }

    /// Static enumeration: every distinct Allow rule path that could grant
    /// `capability`, in first-seen order. Does not consult the path
    /// matcher or conditions.
    pub fn list_accessible_paths(&self, policies: &[Policy], capability: Capability) -> Vec<String> {
        let mut seen = Vec::new();
        for policy in policies {
            for rule in policy.rules() {
                if rule.effect() != Effect::Allow {
                    continue;
                }
                if !rule.grants(capability) {
                    continue;
                }
                let path = rule.path().to_string();
                if !seen.contains(&path) {
                    seen.push(path);
                }
            }
        }
        seen
    }

    /// Union of capabilities granted by every Allow rule matching `path`
    /// under `context`, in first-seen order. Deny rules are ignored;
    /// implication is not expanded.
    pub fn capabilities_at(
        &self,
        policies: &[Policy],
        path: &str,
        context: &Context,
    ) -> Result<Vec<Capability>> {
        let mut seen: Vec<Capability> = Vec::new();
        for policy in policies {
            for rule in policy.rules() {
                if rule.effect() != Effect::Allow {
                    continue;
                }
                if !PathMatcher::matches(rule.path(), path, context)? {
                    continue;
                }
                if !ConditionEvaluator::evaluate_all(rule.conditions(), context) {
                    continue;
                }
                for capability in rule.capabilities() {
                    if !seen.contains(capability) {
                        seen.push(*capability);
                    }
                }
            }
        }
        Ok(seen)
    }
}
