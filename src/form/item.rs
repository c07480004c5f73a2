use std::sync::{Arc, Mutex};

use super::controller::{
    FieldRegistration, FieldStatus, FormController, FormResult, RequiredMark, ValidateTrigger,
};
use super::rule::Rule;
use super::value::FieldValue;

type StatusCallback = Arc<dyn Fn(FieldStatus, &str) + Send + Sync>;
type ChangeCallback = Arc<dyn Fn(&FieldValue, &str) + Send + Sync>;

/// Declaration of one form field, turned into a live binding by [`FormItem::mount`].
#[derive(Clone, Default)]
pub struct FormItem {
    name: String,
    label: Option<String>,
    helper_text: Option<String>,
    error_text: Option<String>,
    rules: Vec<Rule>,
    initial_value: Option<FieldValue>,
    validate_trigger: Option<ValidateTrigger>,
    required: Option<bool>,
    show_required_mark: Option<bool>,
    show_validate_message: Option<bool>,
    on_change: Option<ChangeCallback>,
    on_status_change: Option<StatusCallback>,
}

impl FormItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = Some(value.into());
        self
    }

    pub fn helper_text(mut self, value: impl Into<String>) -> Self {
        self.helper_text = Some(value.into());
        self
    }

    /// Shown instead of the validation errors.
    pub fn error_text(mut self, value: impl Into<String>) -> Self {
        self.error_text = Some(value.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn validate_trigger(mut self, value: ValidateTrigger) -> Self {
        self.validate_trigger = Some(value);
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = Some(value);
        self
    }

    pub fn show_required_mark(mut self, value: bool) -> Self {
        self.show_required_mark = Some(value);
        self
    }

    pub fn show_validate_message(mut self, value: bool) -> Self {
        self.show_validate_message = Some(value);
        self
    }

    pub fn on_change(
        mut self,
        callback: impl Fn(&FieldValue, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn on_status_change(
        mut self,
        callback: impl Fn(FieldStatus, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_status_change = Some(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the field with `controller`. The field unregisters when the
    /// returned binding is dropped.
    pub fn mount(self, controller: &FormController) -> FormResult<MountedField> {
        let mut registration = FieldRegistration::new().rules(self.rules.clone());
        registration.value = self.initial_value.clone();
        controller.register_field(self.name.clone(), registration)?;
        let mounted = MountedField {
            controller: controller.clone(),
            item: self,
            last_status: Mutex::new(None),
        };
        mounted.sync_status()?;
        Ok(mounted)
    }
}

impl std::fmt::Debug for FormItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormItem")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("rules", &self.rules)
            .field("validate_trigger", &self.validate_trigger)
            .finish_non_exhaustive()
    }
}

/// What a host needs to draw one field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldView {
    pub name: String,
    pub label: Option<String>,
    pub value: Option<FieldValue>,
    pub status: FieldStatus,
    pub required: bool,
    pub show_required_mark: bool,
    /// Message to display under the field, if any.
    pub error_message: Option<String>,
    pub helper_text: Option<String>,
    pub disabled: bool,
    pub readonly: bool,
}

/// A registered field bound to its form.
pub struct MountedField {
    controller: FormController,
    item: FormItem,
    last_status: Mutex<Option<FieldStatus>>,
}

impl MountedField {
    pub fn name(&self) -> &str {
        &self.item.name
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    /// Item override, then the first trigger declared by a rule, then the form default.
    pub fn validate_trigger(&self) -> FormResult<ValidateTrigger> {
        if let Some(trigger) = self.item.validate_trigger {
            return Ok(trigger);
        }
        let declared = self
            .controller
            .field_rules(self.name())?
            .iter()
            .find_map(Rule::declared_trigger);
        Ok(declared.unwrap_or(self.controller.options().validate_trigger))
    }

    pub async fn handle_change(&self, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        let name = self.name();
        self.controller.set_field_value(name, value.clone())?;
        self.controller.set_field_touched(name, true)?;
        if self.validate_trigger()? == ValidateTrigger::OnChange {
            self.controller.validate_field(name).await?;
            self.controller.revalidate_dependents(name).await?;
        }
        if let Some(on_change) = &self.item.on_change {
            on_change(&value, name);
        }
        self.sync_status()?;
        Ok(())
    }

    pub async fn handle_blur(&self) -> FormResult<()> {
        let name = self.name();
        self.controller.set_field_touched(name, true)?;
        if self.validate_trigger()? == ValidateTrigger::OnBlur {
            self.controller.validate_field(name).await?;
            self.controller.revalidate_dependents(name).await?;
        }
        self.sync_status()?;
        Ok(())
    }

    pub fn status(&self) -> FormResult<FieldStatus> {
        Ok(self
            .controller
            .get_field(self.name())?
            .map(|info| info.status())
            .unwrap_or(FieldStatus::Normal))
    }

    /// Fires `on_status_change` when the derived status differs from the last one seen.
    pub fn sync_status(&self) -> FormResult<FieldStatus> {
        let status = self.status()?;
        let changed = {
            let mut last = match self.last_status.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let changed = *last != Some(status);
            *last = Some(status);
            changed
        };
        if changed {
            if let Some(on_status_change) = &self.item.on_status_change {
                on_status_change(status, self.name());
            }
        }
        Ok(status)
    }

    pub fn view(&self) -> FormResult<FieldView> {
        let options = self.controller.options();
        let info = self.controller.get_field(self.name())?;
        let (value, errors, status, rule_required) = match &info {
            Some(info) => (
                info.value.clone(),
                info.errors.clone(),
                info.status(),
                info.is_required(),
            ),
            None => (None, Vec::new(), FieldStatus::Normal, false),
        };
        let required = self.item.required.unwrap_or(rule_required);
        let show_required_mark = match (self.item.show_required_mark, options.required_mark) {
            (Some(shown), _) => shown && required,
            (None, RequiredMark::Shown) => required,
            (None, RequiredMark::Hidden) => false,
            (None, RequiredMark::Optional) => !required,
        };
        let show_message = self
            .item
            .show_validate_message
            .unwrap_or(options.show_validate_message);
        let error_message = if show_message {
            self.item
                .error_text
                .clone()
                .or_else(|| errors.first().cloned())
        } else {
            None
        };
        let helper_text = if errors.is_empty() {
            self.item.helper_text.clone()
        } else {
            None
        };

        Ok(FieldView {
            name: self.item.name.clone(),
            label: self.item.label.clone(),
            value,
            status,
            required,
            show_required_mark,
            error_message,
            helper_text,
            disabled: self.controller.is_disabled()?,
            readonly: self.controller.is_readonly()?,
        })
    }
}

impl Drop for MountedField {
    fn drop(&mut self) {
        if let Err(error) = self.controller.unregister_field(&self.item.name) {
            tracing::warn!(field = %self.item.name, %error, "failed to unregister field");
        }
    }
}

impl std::fmt::Debug for MountedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedField")
            .field("name", &self.item.name)
            .finish_non_exhaustive()
    }
}
