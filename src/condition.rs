use std::collections::HashMap;

use crate::model::{ConditionValue, Context};

/// Evaluates a rule's condition map against a caller-supplied context.
///
/// All conditions must hold for a rule to apply: a missing context key, or
/// any single condition failing, fails the whole set.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn evaluate_all(conditions: &HashMap<String, ConditionValue>, context: &Context) -> bool {
        conditions
            .iter()
            .all(|(key, expected)| Self::evaluate_one(key, expected, context))
    }

    fn evaluate_one(key: &str, expected: &ConditionValue, context: &Context) -> bool {
        let Some(actual) = context.get(key) else {
            return false;
        };
        match expected {
            ConditionValue::Scalar(want) => want == actual,
            ConditionValue::Sequence(items) => items.contains(actual),
            ConditionValue::Predicate(predicate) => predicate(actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContextValue;

    fn context(pairs: &[(&str, ContextValue)]) -> Context {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn empty_conditions_are_vacuously_satisfied() {
        let conditions = HashMap::new();
        let ctx = context(&[]);
        assert!(ConditionEvaluator::evaluate_all(&conditions, &ctx));
    }

    #[test]
    fn missing_context_key_fails() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "role".to_string(),
            ConditionValue::Scalar(ContextValue::Str("admin".to_string())),
        );
        let ctx = context(&[]);
        assert!(!ConditionEvaluator::evaluate_all(&conditions, &ctx));
    }

    #[test]
    fn scalar_requires_exact_match() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "role".to_string(),
            ConditionValue::Scalar(ContextValue::Str("admin".to_string())),
        );
        let matching = context(&[("role", ContextValue::Str("admin".to_string()))]);
        let mismatching = context(&[("role", ContextValue::Str("guest".to_string()))]);
        assert!(ConditionEvaluator::evaluate_all(&conditions, &matching));
        assert!(!ConditionEvaluator::evaluate_all(&conditions, &mismatching));
    }

    #[test]
    fn sequence_requires_membership() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "role".to_string(),
            ConditionValue::Sequence(vec![
                ContextValue::Str("admin".to_string()),
                ContextValue::Str("owner".to_string()),
            ]),
        );
        let member = context(&[("role", ContextValue::Str("owner".to_string()))]);
        let non_member = context(&[("role", ContextValue::Str("guest".to_string()))]);
        assert!(ConditionEvaluator::evaluate_all(&conditions, &member));
        assert!(!ConditionEvaluator::evaluate_all(&conditions, &non_member));
    }

    #[test]
    fn predicate_invokes_callback() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "age".to_string(),
            ConditionValue::Predicate(std::sync::Arc::new(|v: &ContextValue| match v {
                ContextValue::Int(n) => *n >= 18,
                _ => false,
            })),
        );
        let adult = context(&[("age", ContextValue::Int(21))]);
        let minor = context(&[("age", ContextValue::Int(10))]);
        assert!(ConditionEvaluator::evaluate_all(&conditions, &adult));
        assert!(!ConditionEvaluator::evaluate_all(&conditions, &minor));
    }

    #[test]
    fn all_conditions_must_hold() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "role".to_string(),
            ConditionValue::Scalar(ContextValue::Str("admin".to_string())),
        );
        conditions.insert(
            "active".to_string(),
            ConditionValue::Scalar(ContextValue::Bool(true)),
        );
        let partial = context(&[("role", ContextValue::Str("admin".to_string()))]);
        let full = context(&[
            ("role", ContextValue::Str("admin".to_string())),
            ("active", ContextValue::Bool(true)),
        ]);
        assert!(!ConditionEvaluator::evaluate_all(&conditions, &partial));
        assert!(ConditionEvaluator::evaluate_all(&conditions, &full));
    }
}
