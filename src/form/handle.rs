use std::collections::BTreeMap;

use thiserror::Error;

use super::controller::{
    FieldInfo, FieldUpdate, FieldValidation, FormController, FormError, FormInstance, FormResult,
    FormStatus,
};
use super::rule::Rule;
use super::submit::{ActionSource, SubmitOutcome};
use super::value::{FieldValue, FormErrors, FormValues};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(FormErrors),
    #[error("submit callback failed: {0}")]
    Rejected(String),
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Programmatic surface of a form, for code outside the field bindings.
///
/// Unlike [`FormController::handle_submit`], [`FormHandle::submit`] reports
/// validation failures and callback failures as errors.
#[allow(async_fn_in_trait)]
pub trait FormHandle {
    fn get_values(&self) -> FormResult<FormValues>;
    fn set_values(&self, values: FormValues) -> FormResult<()>;
    fn get_field_value(&self, name: &str) -> FormResult<Option<FieldValue>>;
    fn set_field_value(&self, name: &str, value: FieldValue) -> FormResult<()>;
    fn reset_fields(&self, names: Option<&[&str]>) -> FormResult<()>;
    async fn submit(&self) -> Result<FormValues, SubmitError>;
    async fn validate(&self, names: Option<&[&str]>) -> FormResult<FormErrors>;
    async fn validate_field(&self, name: &str) -> FormResult<FieldValidation>;
    async fn validate_fields(&self, names: &[&str]) -> FormResult<Vec<FieldValidation>>;
    fn clear_errors(&self, names: Option<&[&str]>) -> FormResult<()>;
    fn set_errors(&self, errors: FormErrors) -> FormResult<()>;
    fn get_field_error(&self, name: &str) -> FormResult<Vec<String>>;
    fn get_errors(&self) -> FormResult<FormErrors>;
    fn set_fields(&self, updates: Vec<(String, FieldUpdate)>) -> FormResult<()>;
    fn get_fields(&self) -> FormResult<Vec<FieldInfo>>;
    fn get_field_info(&self, name: &str) -> FormResult<Option<FieldInfo>>;
    fn set_fields_touched(&self, touched: &BTreeMap<String, bool>) -> FormResult<()>;
    fn set_fields_validating(&self, validating: &BTreeMap<String, bool>) -> FormResult<()>;
    fn add_field_rules(&self, name: &str, rules: Vec<Rule>) -> FormResult<()>;
    fn remove_field_rules(&self, name: &str) -> FormResult<()>;
    fn get_field_rules(&self, name: &str) -> FormResult<Vec<Rule>>;
    fn set_status(&self, status: FormStatus) -> FormResult<()>;
    fn get_status(&self) -> FormResult<FormStatus>;
    fn set_disabled(&self, disabled: bool) -> FormResult<()>;
    fn set_readonly(&self, readonly: bool) -> FormResult<()>;
    fn scroll_to_field(&self, name: &str) -> FormResult<bool>;
    fn get_form_instance(&self) -> FormResult<FormInstance>;
}

impl FormHandle for FormController {
    fn get_values(&self) -> FormResult<FormValues> {
        self.values()
    }

    fn set_values(&self, values: FormValues) -> FormResult<()> {
        FormController::set_values(self, values)
    }

    fn get_field_value(&self, name: &str) -> FormResult<Option<FieldValue>> {
        FormController::get_field_value(self, name)
    }

    fn set_field_value(&self, name: &str, value: FieldValue) -> FormResult<()> {
        FormController::set_field_value(self, name, value)
    }

    fn reset_fields(&self, names: Option<&[&str]>) -> FormResult<()> {
        FormController::reset_fields(self, names)
    }

    async fn submit(&self) -> Result<FormValues, SubmitError> {
        match self.run_submit(ActionSource::Handle).await? {
            SubmitOutcome::Success(values) => Ok(values),
            SubmitOutcome::Invalid(errors) => Err(SubmitError::Invalid(errors)),
            SubmitOutcome::CallbackFailed(message) => Err(SubmitError::Rejected(message)),
        }
    }

    async fn validate(&self, names: Option<&[&str]>) -> FormResult<FormErrors> {
        FormController::validate(self, names).await
    }

    async fn validate_field(&self, name: &str) -> FormResult<FieldValidation> {
        FormController::validate_field(self, name).await
    }

    async fn validate_fields(&self, names: &[&str]) -> FormResult<Vec<FieldValidation>> {
        FormController::validate_fields(self, names).await
    }

    fn clear_errors(&self, names: Option<&[&str]>) -> FormResult<()> {
        FormController::clear_errors(self, names)
    }

    fn set_errors(&self, errors: FormErrors) -> FormResult<()> {
        FormController::set_errors(self, errors)
    }

    fn get_field_error(&self, name: &str) -> FormResult<Vec<String>> {
        FormController::get_field_error(self, name)
    }

    fn get_errors(&self) -> FormResult<FormErrors> {
        self.errors()
    }

    fn set_fields(&self, updates: Vec<(String, FieldUpdate)>) -> FormResult<()> {
        for (name, update) in updates {
            self.update_field(&name, update)?;
        }
        Ok(())
    }

    fn get_fields(&self) -> FormResult<Vec<FieldInfo>> {
        self.fields()
    }

    fn get_field_info(&self, name: &str) -> FormResult<Option<FieldInfo>> {
        self.get_field(name)
    }

    fn set_fields_touched(&self, touched: &BTreeMap<String, bool>) -> FormResult<()> {
        for (name, flag) in touched {
            self.set_field_touched(name, *flag)?;
        }
        Ok(())
    }

    fn set_fields_validating(&self, validating: &BTreeMap<String, bool>) -> FormResult<()> {
        for (name, flag) in validating {
            self.set_field_validating(name, *flag)?;
        }
        Ok(())
    }

    fn add_field_rules(&self, name: &str, rules: Vec<Rule>) -> FormResult<()> {
        FormController::add_field_rules(self, name, rules)
    }

    fn remove_field_rules(&self, name: &str) -> FormResult<()> {
        FormController::remove_field_rules(self, name)
    }

    fn get_field_rules(&self, name: &str) -> FormResult<Vec<Rule>> {
        self.field_rules(name)
    }

    fn set_status(&self, status: FormStatus) -> FormResult<()> {
        FormController::set_status(self, status)
    }

    fn get_status(&self) -> FormResult<FormStatus> {
        self.status()
    }

    fn set_disabled(&self, disabled: bool) -> FormResult<()> {
        FormController::set_disabled(self, disabled)
    }

    fn set_readonly(&self, readonly: bool) -> FormResult<()> {
        FormController::set_readonly(self, readonly)
    }

    fn scroll_to_field(&self, name: &str) -> FormResult<bool> {
        FormController::scroll_to_field(self, name)
    }

    fn get_form_instance(&self) -> FormResult<FormInstance> {
        self.instance()
    }
}
