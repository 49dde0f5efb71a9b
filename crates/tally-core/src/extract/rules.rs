//! Ordered rule chains
//!
//! Every extracted field is produced by a list of rules tried in a fixed
//! order. The first rule that yields a value wins; later rules are not run.

use tracing::debug;

/// One way of recovering a value from message text
pub trait ExtractionRule<T>: Send + Sync {
    /// Short identifier used in logs and tests
    fn name(&self) -> &'static str;

    /// Try to extract a value; `None` passes control to the next rule
    fn attempt(&self, text: &str) -> Option<T>;
}

/// An ordered list of rules for a single field
pub struct RuleChain<T> {
    field: &'static str,
    rules: Vec<Box<dyn ExtractionRule<T>>>,
}

impl<T> RuleChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    /// Append a rule with lower precedence than every rule already present
    pub fn then(mut self, rule: impl ExtractionRule<T> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Value from the first rule that matches, with that rule's name
    pub fn first_match(&self, text: &str) -> Option<(T, &'static str)> {
        for rule in &self.rules {
            if let Some(value) = rule.attempt(text) {
                debug!(field = self.field, rule = rule.name(), "Rule matched");
                return Some((value, rule.name()));
            }
        }
        None
    }

    /// Value from the first rule that matches
    pub fn resolve(&self, text: &str) -> Option<T> {
        self.first_match(text).map(|(value, _)| value)
    }

    /// Rule names in precedence order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T> std::fmt::Debug for RuleChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleChain")
            .field("field", &self.field)
            .field("rules", &self.rule_names())
            .finish()
    }
}
