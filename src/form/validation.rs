use futures::future::join_all;

use super::context::FormEvent;
use super::controller::{
    FieldValidation, FormController, FormResult, ValidationTicket, read_lock, write_lock,
};
use super::rule::{Rule, ValidatorError, Verdict};
use super::value::{FieldValue, FormErrors, FormValues, is_blank};
use crate::i18n::I18nManager;

/// Runs every constraint of `rules` against `value` and collects the failures.
///
/// Checks run category by category across all rules: required, text length,
/// numeric range, pattern, allowed values, sync validators, then async validators
/// one after another. Nothing short-circuits.
pub async fn evaluate_rules(
    rules: &[Rule],
    value: Option<&FieldValue>,
    values: &FormValues,
    i18n: &I18nManager,
) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(required) = rules.iter().find(|rule| rule.required) {
        if is_blank(value) {
            errors.push(message_or(required, || i18n.t("form.required")));
        }
    }

    if let Some(text) = value.and_then(FieldValue::as_text) {
        let length = text.chars().count();
        for rule in rules {
            if let Some(min) = rule.min.filter(|min| length < *min) {
                let min = min.to_string();
                errors.push(message_or(rule, || {
                    i18n.t_with("form.min_length", &[("min", min.as_str())])
                }));
            }
            if let Some(max) = rule.max.filter(|max| length > *max) {
                let max = max.to_string();
                errors.push(message_or(rule, || {
                    i18n.t_with("form.max_length", &[("max", max.as_str())])
                }));
            }
        }
    }

    if let Some(number) = value.and_then(FieldValue::as_number) {
        for rule in rules {
            if let Some(min) = rule.min_value.filter(|min| number < *min) {
                let min = min.to_string();
                errors.push(message_or(rule, || {
                    i18n.t_with("form.min_value", &[("min", min.as_str())])
                }));
            }
            if let Some(max) = rule.max_value.filter(|max| number > *max) {
                let max = max.to_string();
                errors.push(message_or(rule, || {
                    i18n.t_with("form.max_value", &[("max", max.as_str())])
                }));
            }
        }
    }

    let text = value.and_then(FieldValue::as_text);
    for rule in rules {
        if let (Some(pattern), Some(text)) = (&rule.pattern, text) {
            if !pattern.is_match(text) {
                errors.push(message_or(rule, || i18n.t("form.pattern")));
            }
        }
    }

    for rule in rules {
        if let Some(allowed) = &rule.one_of {
            let listed = value.is_some_and(|value| allowed.contains(value));
            if !listed {
                errors.push(message_or(rule, || i18n.t("form.one_of")));
            }
        }
    }

    for rule in rules {
        if let Some(validator) = &rule.validator {
            let verdict = validator(value, values);
            push_verdict(&mut errors, rule, verdict, i18n);
        }
    }

    for rule in rules {
        if let Some(validator) = &rule.async_validator {
            let verdict = validator(value.cloned(), values.clone()).await;
            push_verdict(&mut errors, rule, verdict, i18n);
        }
    }

    errors
}

fn message_or(rule: &Rule, fallback: impl FnOnce() -> String) -> String {
    rule.message.clone().unwrap_or_else(fallback)
}

fn push_verdict(
    errors: &mut Vec<String>,
    rule: &Rule,
    verdict: Result<Verdict, ValidatorError>,
    i18n: &I18nManager,
) {
    match verdict {
        Ok(Verdict::Valid) => {}
        Ok(Verdict::Message(message)) => errors.push(message),
        Ok(Verdict::Invalid) => errors.push(message_or(rule, || i18n.t("form.validator"))),
        Err(error) => {
            tracing::debug!(%error, "custom validator failed");
            errors.push(message_or(rule, || i18n.t("form.validator")));
        }
    }
}

struct PendingValidation {
    ticket: ValidationTicket,
    rules: Vec<Rule>,
    value: Option<FieldValue>,
    values: FormValues,
}

impl FormController {
    /// Validates one registered field and stores the result.
    ///
    /// Unregistered names are a no-op reporting a valid, empty result. When a newer
    /// validation of the same field starts before this one finishes, or the form is
    /// reset meanwhile, the result is returned but not stored.
    pub async fn validate_field(&self, name: &str) -> FormResult<FieldValidation> {
        let Some(pending) = self.begin_validation(name)? else {
            return Ok(FieldValidation::skipped());
        };

        let errors =
            evaluate_rules(&pending.rules, pending.value.as_ref(), &pending.values, &self.i18n)
                .await;

        let stored = {
            let mut state = write_lock(&self.state, "storing field validation result")?;
            let latest = state.is_latest_ticket(name, pending.ticket);
            match state.fields.get_mut(name) {
                Some(entry) if latest => {
                    entry.errors = errors.clone();
                    entry.validating = false;
                    true
                }
                _ => false,
            }
        };
        tracing::debug!(field = %name, valid = errors.is_empty(), stored, "field validated");
        if stored {
            self.publish(FormEvent::FieldChanged {
                name: name.to_string(),
            });
        }

        Ok(FieldValidation {
            valid: errors.is_empty(),
            errors,
            value: pending.value,
        })
    }

    /// Validates `names` concurrently; results follow the order of `names`.
    pub async fn validate_fields(&self, names: &[&str]) -> FormResult<Vec<FieldValidation>> {
        join_all(names.iter().map(|name| self.validate_field(name)))
            .await
            .into_iter()
            .collect()
    }

    /// Validates `names`, or every registered field, and returns only the failures.
    pub async fn validate(&self, names: Option<&[&str]>) -> FormResult<FormErrors> {
        let names = match names {
            Some(names) => names.iter().map(|name| name.to_string()).collect(),
            None => self.registered_fields()?,
        };
        let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
        let results = self.validate_fields(&refs).await?;
        Ok(names
            .into_iter()
            .zip(results)
            .filter(|(_, result)| !result.valid)
            .map(|(name, result)| (name, result.errors))
            .collect())
    }

    /// Re-validates registered, touched fields whose rules depend on `source`.
    pub async fn revalidate_dependents(&self, source: &str) -> FormResult<()> {
        let dependents = {
            let state = read_lock(&self.state, "reading field dependencies")?;
            state
                .fields
                .iter()
                .filter(|(name, entry)| {
                    entry.registered
                        && entry.touched
                        && name.as_str() != source
                        && state
                            .effective_rules(name)
                            .iter()
                            .any(|rule| rule.dependencies.iter().any(|dep| dep == source))
                })
                .map(|(name, _)| name.clone())
                .collect::<Vec<_>>()
        };
        if dependents.is_empty() {
            return Ok(());
        }
        tracing::trace!(source, ?dependents, "revalidating dependent fields");
        let refs = dependents.iter().map(String::as_str).collect::<Vec<_>>();
        self.validate_fields(&refs).await?;
        Ok(())
    }

    fn begin_validation(&self, name: &str) -> FormResult<Option<PendingValidation>> {
        let pending = {
            let mut state = write_lock(&self.state, "starting field validation")?;
            if !state.is_registered(name) {
                return Ok(None);
            }
            let ticket = state.issue_ticket(name);
            state.ensure_entry(name).validating = true;
            PendingValidation {
                ticket,
                rules: state.effective_rules(name),
                value: state.values.get(name).cloned(),
                values: state.values.clone(),
            }
        };
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(Some(pending))
    }
}
