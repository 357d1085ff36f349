//! Immutable value types: `Effect`, `Capability`, `Rule`, `Policy`,
//! `EvaluationResult`, and the context/condition value tagged unions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{Result, SignpostError};

/// A decision a matching rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl Default for Effect {
    fn default() -> Self {
        Effect::Allow
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        })
    }
}

impl std::str::FromStr for Effect {
    type Err = SignpostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            other => Err(SignpostError::UnknownEffect {
                value: other.to_string(),
            }),
        }
    }
}

impl Serialize for Effect {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Effect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The closed set of actions a rule can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    List,
    Create,
    Update,
    Delete,
    Admin,
}

impl Capability {
    /// `a.implies(b)` is true iff `a == Admin` or `a == b`.
    pub fn implies(&self, other: Capability) -> bool {
        *self == Capability::Admin || *self == other
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Read => "read",
            Capability::List => "list",
            Capability::Create => "create",
            Capability::Update => "update",
            Capability::Delete => "delete",
            Capability::Admin => "admin",
        })
    }
}

impl std::str::FromStr for Capability {
    type Err = SignpostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(Capability::Read),
            "list" => Ok(Capability::List),
            "create" => Ok(Capability::Create),
            "update" => Ok(Capability::Update),
            "delete" => Ok(Capability::Delete),
            "admin" => Ok(Capability::Admin),
            other => Err(SignpostError::UnknownCapability {
                value: other.to_string(),
            }),
        }
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A value pulled out of the caller's context map.
///
/// This is the concrete shape behind the specification's "arbitrary
/// value" context entries (string, integer, boolean, sequence).
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<ContextValue>),
}

impl ContextValue {
    /// Stringify for use in `${name}` variable substitution.
    pub fn stringify(&self) -> String {
        match self {
            ContextValue::Str(s) => s.clone(),
            ContextValue::Int(i) => i.to_string(),
            ContextValue::Bool(b) => b.to_string(),
            ContextValue::List(items) => items
                .iter()
                .map(ContextValue::stringify)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Convert a `serde_json::Value` scalar/sequence into a `ContextValue`,
    /// rejecting shapes (objects, null) that have no context meaning.
    pub fn from_json(key: &str, value: &Json) -> Result<ContextValue> {
        match value {
            Json::String(s) => Ok(ContextValue::Str(s.clone())),
            Json::Bool(b) => Ok(ContextValue::Bool(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(ContextValue::Int)
                .ok_or_else(|| SignpostError::UnsupportedConditionValue {
                    key: key.to_string(),
                }),
            Json::Array(items) => {
                let values = items
                    .iter()
                    .map(|v| ContextValue::from_json(key, v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ContextValue::List(values))
            }
            Json::Null | Json::Object(_) => Err(SignpostError::UnsupportedConditionValue {
                key: key.to_string(),
            }),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Str(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Str(s)
    }
}

impl From<i64> for ContextValue {
    fn from(i: i64) -> Self {
        ContextValue::Int(i)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

/// A caller-supplied, read-only mapping of ambient attributes.
pub type Context = HashMap<String, ContextValue>;

/// A predicate callback, boxed behind an `Arc` so `Rule` stays cheaply
/// cloneable. Per the specification's design notes, this is exposed as a
/// single-method callback rather than any reflective dispatch.
pub type Predicate = Arc<dyn Fn(&ContextValue) -> bool + Send + Sync>;

/// A single condition's expected value: a scalar, a membership set, or a
/// predicate callback.
#[derive(Clone)]
pub enum ConditionValue {
    Scalar(ContextValue),
    Sequence(Vec<ContextValue>),
    Predicate(Predicate),
}

impl fmt::Debug for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            ConditionValue::Sequence(v) => f.debug_tuple("Sequence").field(v).finish(),
            ConditionValue::Predicate(_) => f.write_str("Predicate(<callback>)"),
        }
    }
}

impl PartialEq for ConditionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConditionValue::Scalar(a), ConditionValue::Scalar(b)) => a == b,
            (ConditionValue::Sequence(a), ConditionValue::Sequence(b)) => a == b,
            (ConditionValue::Predicate(a), ConditionValue::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ConditionValue {
    /// Parse a condition value out of a document fragment (spec §6.1). Only
    /// scalars and sequences are representable in a document; predicates are
    /// a Rust-native builder feature (see `Rule::with_predicate_condition`).
    pub fn from_json(key: &str, value: &Json) -> Result<ConditionValue> {
        match value {
            Json::Array(items) => {
                let values = items
                    .iter()
                    .map(|v| ContextValue::from_json(key, v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConditionValue::Sequence(values))
            }
            Json::String(_) | Json::Bool(_) | Json::Number(_) => {
                Ok(ConditionValue::Scalar(ContextValue::from_json(key, value)?))
            }
            Json::Null | Json::Object(_) => Err(SignpostError::UnsupportedConditionValue {
                key: key.to_string(),
            }),
        }
    }

    /// Serialize back to a document fragment. Returns `None` for predicates,
    /// which have no document representation.
    pub fn to_json(&self) -> Option<Json> {
        match self {
            ConditionValue::Scalar(v) => Some(context_value_to_json(v)),
            ConditionValue::Sequence(items) => {
                Some(Json::Array(items.iter().map(context_value_to_json).collect()))
            }
            ConditionValue::Predicate(_) => None,
        }
    }
}

fn context_value_to_json(value: &ContextValue) -> Json {
    match value {
        ContextValue::Str(s) => Json::String(s.clone()),
        ContextValue::Int(i) => Json::Number((*i).into()),
        ContextValue::Bool(b) => Json::Bool(*b),
        ContextValue::List(items) => Json::Array(items.iter().map(context_value_to_json).collect()),
    }
}

/// An immutable (path-pattern, effect, capability set, condition set) row.
#[derive(Debug, Clone)]
pub struct Rule {
    path: String,
    effect: Effect,
    capabilities: Vec<Capability>,
    conditions: HashMap<String, ConditionValue>,
    description: Option<String>,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.effect == other.effect
            && self.capabilities == other.capabilities
            && self.description == other.description
            && self.conditions == other.conditions
    }
}

impl Rule {
    /// Build a new rule with `Allow` effect, no capabilities, and no
    /// conditions. Use the fluent `with_*` methods to fill in the rest.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            effect: Effect::default(),
            capabilities: Vec::new(),
            conditions: HashMap::new(),
            description: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_condition(mut self, key: impl Into<String>, value: ConditionValue) -> Self {
        self.conditions.insert(key.into(), value);
        self
    }

    /// Attach a predicate condition: satisfied iff the callback returns
    /// true when invoked with the context value for `key`.
    pub fn with_predicate_condition(
        self,
        key: impl Into<String>,
        predicate: impl Fn(&ContextValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with_condition(key, ConditionValue::Predicate(Arc::new(predicate)))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn conditions(&self) -> &HashMap<String, ConditionValue> {
        &self.conditions
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// True iff some held capability implies `requested`.
    pub fn grants(&self, requested: Capability) -> bool {
        self.capabilities.iter().any(|c| c.implies(requested))
    }

    /// Parse a rule from a document fragment (spec §6.1).
    pub fn from_document(value: &Json) -> Result<Rule> {
        let obj = value
            .as_object()
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "rule must be an object".to_string(),
            })?;

        let path = obj
            .get("path")
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "rule missing required field 'path'".to_string(),
            })?
            .as_str()
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "rule 'path' must be a string".to_string(),
            })?;
        if path.is_empty() {
            return Err(SignpostError::InvalidPolicyData {
                reason: "rule 'path' must be non-empty".to_string(),
            });
        }

        let effect = match obj.get("effect") {
            None => Effect::default(),
            Some(Json::String(s)) => s.parse()?,
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "rule 'effect' must be a string".to_string(),
                })
            }
        };

        let capabilities = match obj.get("capabilities") {
            None => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .ok_or_else(|| SignpostError::InvalidPolicyData {
                            reason: "rule 'capabilities' entries must be strings".to_string(),
                        })
                        .and_then(|s| s.parse::<Capability>())
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "rule 'capabilities' must be an array".to_string(),
                })
            }
        };

        let conditions = match obj.get("conditions") {
            None => HashMap::new(),
            Some(Json::Object(map)) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), ConditionValue::from_json(k, v)?)))
                .collect::<Result<HashMap<_, _>>>()?,
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "rule 'conditions' must be an object".to_string(),
                })
            }
        };

        let description = match obj.get("description") {
            None => None,
            Some(Json::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "rule 'description' must be a string".to_string(),
                })
            }
        };

        Ok(Rule {
            path: path.to_string(),
            effect,
            capabilities,
            conditions,
            description,
        })
    }

    /// Serialize back to a document fragment (spec §6.1). Predicate
    /// conditions, which have no document form, are omitted.
    pub fn to_document(&self) -> Json {
        let mut obj = serde_json::Map::new();
        obj.insert("path".to_string(), Json::String(self.path.clone()));
        obj.insert("effect".to_string(), Json::String(self.effect.to_string()));
        obj.insert(
            "capabilities".to_string(),
            Json::Array(
                self.capabilities
                    .iter()
                    .map(|c| Json::String(c.to_string()))
                    .collect(),
            ),
        );
        let mut conditions = serde_json::Map::new();
        for (k, v) in &self.conditions {
            if let Some(json) = v.to_json() {
                conditions.insert(k.clone(), json);
            }
        }
        obj.insert("conditions".to_string(), Json::Object(conditions));
        if let Some(description) = &self.description {
            obj.insert("description".to_string(), Json::String(description.clone()));
        }
        Json::Object(obj)
    }
}

/// A named, ordered bundle of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    name: String,
    description: String,
    rules: Vec<Rule>,
}

impl Policy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules = rules.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Parse a policy from a structured document (spec §6.1).
    pub fn from_document(value: &Json) -> Result<Policy> {
        let obj = value
            .as_object()
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "policy document must be an object".to_string(),
            })?;

        let name = obj
            .get("name")
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "policy missing required field 'name'".to_string(),
            })?
            .as_str()
            .ok_or_else(|| SignpostError::InvalidPolicyData {
                reason: "policy 'name' must be a string".to_string(),
            })?;
        if name.is_empty() {
            return Err(SignpostError::InvalidPolicyData {
                reason: "policy 'name' must be non-empty".to_string(),
            });
        }

        let description = match obj.get("description") {
            None => String::new(),
            Some(Json::String(s)) => s.clone(),
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "policy 'description' must be a string".to_string(),
                })
            }
        };

        let rules = match obj.get("rules") {
            None => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(Rule::from_document)
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(SignpostError::InvalidPolicyData {
                    reason: "policy 'rules' must be an array".to_string(),
                })
            }
        };

        Ok(Policy {
            name: name.to_string(),
            description,
            rules,
        })
    }

    /// Serialize back to a structured document (spec §6.1). Round-trips
    /// bit-exact for every well-formed policy built from a document.
    pub fn to_document(&self) -> Json {
        let mut obj = serde_json::Map::new();
        obj.insert("name".to_string(), Json::String(self.name.clone()));
        obj.insert(
            "description".to_string(),
            Json::String(self.description.clone()),
        );
        obj.insert(
            "rules".to_string(),
            Json::Array(self.rules.iter().map(Rule::to_document).collect()),
        );
        Json::Object(obj)
    }
}

/// The outcome of evaluating a capability request against a set of
/// policies.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub allowed: bool,
    pub explicit_deny: bool,
    pub matched_rule: Option<Rule>,
    pub matched_policy: Option<Policy>,
    pub reason: String,
    pub evaluated_policies: Vec<Policy>,
}

impl EvaluationResult {
    pub(crate) fn allow(rule: Rule, policy: Policy, reason: String, evaluated: Vec<Policy>) -> Self {
        Self {
            allowed: true,
            explicit_deny: false,
            matched_rule: Some(rule),
            matched_policy: Some(policy),
            reason,
            evaluated_policies: evaluated,
        }
    }

    pub(crate) fn explicit_deny(
        rule: Rule,
        policy: Policy,
        reason: String,
        evaluated: Vec<Policy>,
    ) -> Self {
        Self {
            allowed: false,
            explicit_deny: true,
            matched_rule: Some(rule),
            matched_policy: Some(policy),
            reason,
            evaluated_policies: evaluated,
        }
    }

    pub(crate) fn implicit_deny(reason: String, evaluated: Vec<Policy>) -> Self {
        Self {
            allowed: false,
            explicit_deny: false,
            matched_rule: None,
            matched_policy: None,
            reason,
            evaluated_policies: evaluated,
        }
    }
}
