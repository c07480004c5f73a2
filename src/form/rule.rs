use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use rust_decimal::Decimal;

use super::controller::ValidateTrigger;
use super::value::{FieldValue, FormValues};

/// Outcome of a custom validator, mirroring a `bool | string` return.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Valid,
    /// Failed; the rule message or the default message is reported.
    Invalid,
    /// Failed with this exact message.
    Message(String),
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value { Verdict::Valid } else { Verdict::Invalid }
    }
}

impl From<&str> for Verdict {
    fn from(value: &str) -> Self {
        Verdict::Message(value.to_string())
    }
}

impl From<String> for Verdict {
    fn from(value: String) -> Self {
        Verdict::Message(value)
    }
}

pub type ValidatorError = Box<dyn std::error::Error + Send + Sync>;

pub type BoxedVerdictFuture = Pin<Box<dyn Future<Output = Result<Verdict, ValidatorError>> + Send>>;

pub(super) type SyncRuleValidator =
    Arc<dyn Fn(Option<&FieldValue>, &FormValues) -> Result<Verdict, ValidatorError> + Send + Sync>;
pub(super) type AsyncRuleValidator =
    Arc<dyn Fn(Option<FieldValue>, FormValues) -> BoxedVerdictFuture + Send + Sync>;

/// One constraint attached to a field. Every set constraint is checked; a rule
/// may combine several of them.
#[derive(Clone, Default)]
pub struct Rule {
    pub(super) required: bool,
    pub(super) message: Option<String>,
    pub(super) min: Option<usize>,
    pub(super) max: Option<usize>,
    pub(super) min_value: Option<Decimal>,
    pub(super) max_value: Option<Decimal>,
    pub(super) pattern: Option<Regex>,
    pub(super) one_of: Option<Vec<FieldValue>>,
    pub(super) validator: Option<SyncRuleValidator>,
    pub(super) async_validator: Option<AsyncRuleValidator>,
    pub(super) default_value: Option<FieldValue>,
    pub(super) trigger: Option<ValidateTrigger>,
    pub(super) dependencies: Vec<String>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn message(mut self, value: impl Into<String>) -> Self {
        self.message = Some(value.into());
        self
    }

    pub fn min(mut self, value: usize) -> Self {
        self.min = Some(value);
        self
    }

    pub fn max(mut self, value: usize) -> Self {
        self.max = Some(value);
        self
    }

    pub fn min_value(mut self, value: impl Into<Decimal>) -> Self {
        self.min_value = Some(value.into());
        self
    }

    pub fn max_value(mut self, value: impl Into<Decimal>) -> Self {
        self.max_value = Some(value.into());
        self
    }

    pub fn pattern(mut self, value: Regex) -> Self {
        self.pattern = Some(value);
        self
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn validator<F, R>(mut self, validator: F) -> Self
    where
        F: Fn(Option<&FieldValue>, &FormValues) -> Result<R, ValidatorError> + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        let wrapped: SyncRuleValidator = Arc::new(
            move |value: Option<&FieldValue>, values: &FormValues| -> Result<Verdict, ValidatorError> {
                validator(value, values).map(Into::into)
            },
        );
        self.validator = Some(wrapped);
        self
    }

    pub fn async_validator<F, Fut, R>(mut self, validator: F) -> Self
    where
        F: Fn(Option<FieldValue>, FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ValidatorError>> + Send + 'static,
        R: Into<Verdict>,
    {
        let wrapped: AsyncRuleValidator = Arc::new(
            move |value: Option<FieldValue>, values: FormValues| -> BoxedVerdictFuture {
                let fut = validator(value, values);
                Box::pin(async move { fut.await.map(Into::into) })
            },
        );
        self.async_validator = Some(wrapped);
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn trigger(mut self, value: ValidateTrigger) -> Self {
        self.trigger = Some(value);
        self
    }

    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.dependencies.push(field.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rule_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn declared_default(&self) -> Option<&FieldValue> {
        self.default_value.as_ref()
    }

    pub fn declared_trigger(&self) -> Option<ValidateTrigger> {
        self.trigger
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("required", &self.required)
            .field("message", &self.message)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("one_of", &self.one_of)
            .field("validator", &self.validator.is_some())
            .field("async_validator", &self.async_validator.is_some())
            .field("default_value", &self.default_value)
            .field("trigger", &self.trigger)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// First `default_value` declared across `rules`, in order.
pub fn rule_default(rules: &[Rule]) -> Option<FieldValue> {
    rules.iter().find_map(|rule| rule.default_value.clone())
}
