use std::collections::HashMap;

use signpost::{
    Capability, ContextValue, Effect, Evaluator, InMemoryPolicyRepository, Policy, PolicyManager,
    PolicySource, Rule,
};

fn customer_policy() -> Policy {
    Policy::new("customer-access")
        .with_description("Customer-scoped read access")
        .with_rule(
            Rule::new("/customers/${customer_id}/orders/*")
                .with_capability(Capability::Read)
                .with_condition(
                    "customer_id",
                    signpost::ConditionValue::Predicate(std::sync::Arc::new(|_| true)),
                ),
        )
        .with_rule(
            Rule::new("/customers/${customer_id}/orders/*/secret")
                .with_effect(Effect::Deny)
                .with_description("Order secrets are never readable"),
        )
}

fn admin_policy() -> Policy {
    Policy::new("admin-access").with_rule(Rule::new("/**").with_capability(Capability::Admin))
}

#[test]
fn most_specific_rule_wins_across_policies() {
    let evaluator = Evaluator::new();
    let policies = vec![admin_policy(), customer_policy()];
    let context: HashMap<String, ContextValue> =
        [("customer_id".to_string(), ContextValue::Str("acme".to_string()))].into();

    let result = evaluator
        .evaluate(
            &policies,
            Capability::Read,
            "/customers/acme/orders/42",
            &context,
        )
        .unwrap();

    assert!(result.allowed);
    assert_eq!(result.matched_policy.unwrap().name(), "customer-access");
}

#[test]
fn explicit_deny_beats_more_specific_allow_from_another_policy() {
    let evaluator = Evaluator::new();
    let policies = vec![admin_policy(), customer_policy()];
    let context: HashMap<String, ContextValue> =
        [("customer_id".to_string(), ContextValue::Str("acme".to_string()))].into();

    let result = evaluator
        .evaluate(
            &policies,
            Capability::Admin,
            "/customers/acme/orders/42/secret",
            &context,
        )
        .unwrap();

    assert!(!result.allowed);
    assert!(result.explicit_deny);
    assert_eq!(result.matched_policy.unwrap().name(), "customer-access");
}

#[test]
fn unsatisfied_condition_falls_through_to_next_candidate_on_same_path() {
    let evaluator = Evaluator::new();
    let conditioned = Rule::new("/api/users")
        .with_capability(Capability::Read)
        .with_condition(
            "role",
            signpost::ConditionValue::Scalar(ContextValue::Str("admin".to_string())),
        );
    let unconditioned = Rule::new("/api/users").with_capability(Capability::Read);
    let policy = Policy::new("api-users")
        .with_rule(conditioned)
        .with_rule(unconditioned);

    let mut context = HashMap::new();
    context.insert("role".to_string(), ContextValue::Str("user".to_string()));

    let result = evaluator
        .evaluate(&[policy], Capability::Read, "/api/users", &context)
        .unwrap();

    assert!(result.allowed);
    assert!(result.matched_rule.unwrap().conditions().is_empty());
}

#[test]
fn no_match_anywhere_is_implicit_deny() {
    let evaluator = Evaluator::new();
    let policies = vec![customer_policy()];
    let result = evaluator
        .evaluate(&policies, Capability::Read, "/unrelated/path", &HashMap::new())
        .unwrap();

    assert!(!result.allowed);
    assert!(!result.explicit_deny);
    assert!(result.matched_rule.is_none());
    assert_eq!(result.reason, "No matching rule found");
}

#[test]
fn manager_path_first_flow_enumerates_capabilities_through_repository() {
    let repository = InMemoryPolicyRepository::new()
        .with_policy(admin_policy())
        .with_policy(customer_policy());
    let manager = PolicyManager::new(repository);

    let context: HashMap<String, ContextValue> =
        [("customer_id".to_string(), ContextValue::Str("acme".to_string()))].into();

    let caps = manager
        .query()
        .policies(vec![
            PolicySource::from("admin-access"),
            PolicySource::from("customer-access"),
        ])
        .path("/customers/acme/orders/7")
        .context(context)
        .capabilities()
        .unwrap();

    assert!(caps.contains(&Capability::Admin));
    assert!(caps.contains(&Capability::Read));
}

#[test]
fn manager_policy_first_flow_mixes_name_and_value() {
    let repository = InMemoryPolicyRepository::new().with_policy(admin_policy());
    let manager = PolicyManager::new(repository);

    let inline_deny = Policy::new("ad-hoc-deny")
        .with_rule(Rule::new("/quarantine/**").with_effect(Effect::Deny));

    let result = manager
        .query()
        .policy("admin-access")
        .policy(inline_deny)
        .path("/quarantine/item")
        .capability(Capability::Admin)
        .evaluate()
        .unwrap();

    assert!(result.explicit_deny);
}

#[test]
fn list_accessible_paths_is_a_static_hint_ignoring_conditions() {
    let evaluator = Evaluator::new();
    let policies = vec![customer_policy()];
    let paths = evaluator.list_accessible_paths(&policies, Capability::Read);
    assert_eq!(paths, vec!["/customers/${customer_id}/orders/*".to_string()]);
}
