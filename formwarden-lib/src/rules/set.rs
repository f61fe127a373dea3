//! Rule sets and the fluent builder used to declare them.

use std::future::Future;

use super::{Rule, RuleContext};

/// Rules for every validated field, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fluent rule set declaration.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder { set: Self::new() }
    }

    /// Appends rules to a field, declaring the field if it is new.
    pub fn insert(&mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((field, rules.into_iter().collect())),
        }
    }

    /// Adds rules to a field and returns the set.
    pub fn with(mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.insert(field, rules);
        self
    }

    /// Rules declared for a field.
    pub fn rules_for(&self, field: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Declared field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(field, rules)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>, R: IntoIterator<Item = Rule>> FromIterator<(S, R)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (S, R)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (field, rules) in iter {
            set.insert(field, rules);
        }
        set
    }
}

/// Builder for declaring a [`RuleSet`] field by field.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    set: RuleSet,
}

impl RuleSetBuilder {
    /// Start declaring rules for a field.
    pub fn field(self, name: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            builder: self,
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Finish the declaration.
    pub fn build(self) -> RuleSet {
        self.set
    }
}

/// Builder for adding validation rules to a single field.
#[derive(Debug)]
pub struct FieldBuilder {
    builder: RuleSetBuilder,
    name: String,
    rules: Vec<Rule>,
}

impl FieldBuilder {
    /// Add a prepared rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a custom synchronous rule.
    pub fn check<F>(self, f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(&str, &RuleContext) -> bool + Send + Sync + 'static,
    {
        self.rule(Rule::new(f, msg))
    }

    /// Add a custom asynchronous rule.
    pub fn check_async<F, Fut>(self, f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(String, RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.rule(Rule::new_async(f, msg))
    }

    /// Make the most recently added rule depend on other fields.
    pub fn depends_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(last) = self.rules.pop() {
            self.rules.push(last.depends_on(fields));
        }
        self
    }

    /// Require the field to be non-empty.
    pub fn required(self, msg: impl Into<String>) -> Self {
        self.rule(Rule::required(msg))
    }

    /// Require minimum length (in characters).
    pub fn min_length(self, min: usize, msg: impl Into<String>) -> Self {
        self.rule(Rule::min_length(min, msg))
    }

    /// Require maximum length (in characters).
    pub fn max_length(self, max: usize, msg: impl Into<String>) -> Self {
        self.rule(Rule::max_length(max, msg))
    }

    /// Require the value to match a regex pattern.
    pub fn pattern(self, re: regex::Regex, msg: impl Into<String>) -> Self {
        self.rule(Rule::pattern(re, msg))
    }

    /// Require a valid email address.
    pub fn email(self, msg: impl Into<String>) -> Self {
        self.rule(Rule::email(msg))
    }

    /// Require the value to contain a substring.
    pub fn contains(self, substr: impl Into<String>, msg: impl Into<String>) -> Self {
        self.rule(Rule::contains(substr, msg))
    }

    /// Require the value to equal another field's value.
    pub fn equals_field(self, other: impl Into<String>, msg: impl Into<String>) -> Self {
        self.rule(Rule::equals_field(other, msg))
    }

    /// Continue to the next field.
    pub fn field(self, name: impl Into<String>) -> FieldBuilder {
        self.finalize().field(name)
    }

    /// Finish the declaration.
    pub fn build(self) -> RuleSet {
        self.finalize().build()
    }

    fn finalize(self) -> RuleSetBuilder {
        let mut builder = self.builder;
        builder.set.insert(self.name, self.rules);
        builder
    }
}
