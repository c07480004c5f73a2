use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::context::{FormEvent, SubscriberRegistry, Subscription};
use super::rule::{Rule, rule_default};
use super::submit::FormCallbacks;
use super::value::{FieldValue, FormErrors, FormModel, FormValues};
use crate::i18n::{I18nManager, Locale};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValidationTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum ValidateTrigger {
    OnChange,
    #[default]
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum FormStatus {
    #[default]
    Normal,
    Error,
    Warning,
    Success,
    Loading,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldStatus {
    Normal,
    Error,
    Warning,
    Success,
    Validating,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum RequiredMark {
    #[default]
    Shown,
    Hidden,
    /// Mark optional fields instead of required ones.
    Optional,
}

#[derive(Clone, Debug)]
pub struct FormOptions {
    pub initial_values: FormValues,
    pub rules: BTreeMap<String, Vec<Rule>>,
    pub validate_trigger: ValidateTrigger,
    /// Keep the value of a field after it unregisters.
    pub preserve: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub show_validate_message: bool,
    pub required_mark: RequiredMark,
    pub scroll_to_first_error: bool,
    pub locale: Locale,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            initial_values: FormValues::new(),
            rules: BTreeMap::new(),
            validate_trigger: ValidateTrigger::OnBlur,
            preserve: true,
            disabled: false,
            readonly: false,
            show_validate_message: true,
            required_mark: RequiredMark::Shown,
            scroll_to_first_error: false,
            locale: Locale::System,
        }
    }
}

impl FormOptions {
    pub fn initial_value(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.initial_values.insert(name.into(), value.into());
        self
    }

    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.entry(name.into()).or_default().push(rule);
        self
    }

    pub fn validate_trigger(mut self, value: ValidateTrigger) -> Self {
        self.validate_trigger = value;
        self
    }

    pub fn preserve(mut self, value: bool) -> Self {
        self.preserve = value;
        self
    }

    pub fn scroll_to_first_error(mut self, value: bool) -> Self {
        self.scroll_to_first_error = value;
        self
    }

    pub fn locale(mut self, value: impl Into<Locale>) -> Self {
        self.locale = value.into();
        self
    }
}

/// Snapshot of one field.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub value: Option<FieldValue>,
    pub errors: Vec<String>,
    pub touched: bool,
    pub validating: bool,
    pub rules: Vec<Rule>,
}

impl FieldInfo {
    pub fn status(&self) -> FieldStatus {
        if self.validating {
            FieldStatus::Validating
        } else if !self.errors.is_empty() {
            FieldStatus::Error
        } else if self.touched {
            FieldStatus::Success
        } else {
            FieldStatus::Normal
        }
    }

    pub fn is_required(&self) -> bool {
        self.rules.iter().any(Rule::is_required)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FieldRegistration {
    pub value: Option<FieldValue>,
    pub rules: Vec<Rule>,
}

impl FieldRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }
}

/// Partial update of a field; unset members are left alone.
#[derive(Clone, Debug, Default)]
pub struct FieldUpdate {
    pub value: Option<FieldValue>,
    pub errors: Option<Vec<String>>,
    pub touched: Option<bool>,
    pub validating: Option<bool>,
    pub rules: Option<Vec<Rule>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub value: Option<FieldValue>,
}

impl FieldValidation {
    pub(super) fn skipped() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            value: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormInstance {
    pub id: FormId,
    pub values: FormValues,
    pub errors: FormErrors,
    pub touched: BTreeMap<String, bool>,
    pub validating: BTreeMap<String, bool>,
    pub fields: BTreeMap<String, FieldInfo>,
    pub rules: BTreeMap<String, Vec<Rule>>,
    pub status: FormStatus,
    pub disabled: bool,
    pub readonly: bool,
    pub submit_state: SubmitState,
    pub submit_count: u32,
}

impl FormInstance {
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    pub fn is_dirty(&self) -> bool {
        self.touched.values().any(|touched| *touched)
    }

    pub fn is_submitting(&self) -> bool {
        self.status == FormStatus::Loading
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
    #[error("field `{field}` is missing or holds a value of the wrong type")]
    FieldTypeMismatch { field: &'static str },
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type ScrollHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Debug, Default)]
pub(super) struct FieldEntry {
    pub(super) registered: bool,
    pub(super) rules: Vec<Rule>,
    pub(super) errors: Vec<String>,
    pub(super) touched: bool,
    pub(super) validating: bool,
}

impl FieldEntry {
    fn clear_meta(&mut self) {
        self.errors.clear();
        self.touched = false;
        self.validating = false;
    }
}

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) values: FormValues,
    pub(super) fields: BTreeMap<String, FieldEntry>,
    pub(super) rules: BTreeMap<String, Vec<Rule>>,
    pub(super) status: FormStatus,
    pub(super) disabled: bool,
    pub(super) readonly: bool,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) next_ticket: u64,
    pub(super) tickets: BTreeMap<String, ValidationTicket>,
}

impl FormState {
    pub(super) fn ensure_entry(&mut self, name: &str) -> &mut FieldEntry {
        self.fields.entry(name.to_string()).or_default()
    }

    pub(super) fn is_registered(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|entry| entry.registered)
    }

    pub(super) fn registered_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, entry)| entry.registered)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(super) fn effective_rules(&self, name: &str) -> Vec<Rule> {
        let mut rules = self.rules.get(name).cloned().unwrap_or_default();
        if let Some(entry) = self.fields.get(name) {
            rules.extend(entry.rules.iter().cloned());
        }
        rules
    }

    pub(super) fn field_info(&self, name: &str) -> Option<FieldInfo> {
        let entry = self.fields.get(name)?;
        Some(FieldInfo {
            name: name.to_string(),
            value: self.values.get(name).cloned(),
            errors: entry.errors.clone(),
            touched: entry.touched,
            validating: entry.validating,
            rules: self.effective_rules(name),
        })
    }

    pub(super) fn registered_infos(&self) -> Vec<FieldInfo> {
        self.registered_names()
            .iter()
            .filter_map(|name| self.field_info(name))
            .collect()
    }

    pub(super) fn errors(&self) -> FormErrors {
        self.fields
            .iter()
            .filter(|(_, entry)| !entry.errors.is_empty())
            .map(|(name, entry)| (name.clone(), entry.errors.clone()))
            .collect()
    }

    pub(super) fn issue_ticket(&mut self, name: &str) -> ValidationTicket {
        self.next_ticket += 1;
        let ticket = ValidationTicket(self.next_ticket);
        self.tickets.insert(name.to_string(), ticket);
        ticket
    }

    pub(super) fn is_latest_ticket(&self, name: &str, ticket: ValidationTicket) -> bool {
        self.tickets.get(name).copied() == Some(ticket)
    }

    /// Puts a registered field back to its declared default and clears its meta.
    pub(super) fn reset_entry(&mut self, name: &str) {
        let default = rule_default(&self.effective_rules(name));
        match default {
            Some(value) => {
                self.values.insert(name.to_string(), value);
            }
            None => {
                self.values.remove(name);
            }
        }
        self.tickets.remove(name);
        if let Some(entry) = self.fields.get_mut(name) {
            entry.clear_meta();
        }
    }
}

/// Shared form store. Clones share the same state, so a controller can be handed
/// to every field binding of the form.
#[derive(Clone)]
pub struct FormController {
    pub(super) options: Arc<FormOptions>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) callbacks: Arc<FormCallbacks>,
    pub(super) subscribers: Arc<SubscriberRegistry>,
    pub(super) scroll_handlers: Arc<RwLock<BTreeMap<String, ScrollHandler>>>,
    pub(super) i18n: I18nManager,
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("FormController");
        if let Ok(state) = self.state.read() {
            debug
                .field("id", &state.id)
                .field("values", &state.values)
                .field("status", &state.status);
        }
        debug.finish_non_exhaustive()
    }
}

impl FormController {
    pub fn new(options: FormOptions) -> Self {
        Self::with_callbacks(options, FormCallbacks::default())
    }

    pub fn with_callbacks(options: FormOptions, callbacks: FormCallbacks) -> Self {
        let i18n = I18nManager::with_locale(options.locale.clone());
        let state = FormState {
            id: FormId::next(),
            values: options.initial_values.clone(),
            fields: BTreeMap::new(),
            rules: options.rules.clone(),
            status: FormStatus::Normal,
            disabled: options.disabled,
            readonly: options.readonly,
            submit_state: SubmitState::Idle,
            submit_count: 0,
            next_ticket: 0,
            tickets: BTreeMap::new(),
        };
        Self {
            options: Arc::new(options),
            state: Arc::new(RwLock::new(state)),
            callbacks: Arc::new(callbacks),
            subscribers: Arc::new(SubscriberRegistry::default()),
            scroll_handlers: Arc::new(RwLock::new(BTreeMap::new())),
            i18n,
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn i18n(&self) -> &I18nManager {
        &self.i18n
    }

    pub fn subscribe(&self, listener: impl Fn(&FormEvent) + Send + Sync + 'static) -> Subscription {
        self.subscribers.subscribe(None, listener)
    }

    /// Listens to events of one field plus form-wide events.
    pub fn subscribe_field(
        &self,
        name: impl Into<String>,
        listener: impl Fn(&FormEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribers.subscribe(Some(name.into()), listener)
    }

    pub(super) fn publish(&self, event: FormEvent) {
        self.subscribers.publish(&event);
    }

    pub fn register_field(
        &self,
        name: impl Into<String>,
        registration: FieldRegistration,
    ) -> FormResult<()> {
        let name = name.into();
        {
            let mut state = write_lock(&self.state, "registering field")?;
            if !state.values.contains_key(&name) {
                if let Some(value) = registration.value {
                    state.values.insert(name.clone(), value);
                }
            }
            state.tickets.remove(&name);
            state.fields.insert(
                name.clone(),
                FieldEntry {
                    registered: true,
                    rules: registration.rules,
                    ..FieldEntry::default()
                },
            );
        }
        tracing::trace!(field = %name, "field registered");
        self.publish(FormEvent::FieldRegistered { name });
        Ok(())
    }

    pub fn unregister_field(&self, name: &str) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "unregistering field")?;
            if state.fields.remove(name).is_none() {
                return Ok(());
            }
            state.tickets.remove(name);
            if !self.options.preserve {
                state.values.remove(name);
            }
        }
        tracing::trace!(field = %name, preserve = self.options.preserve, "field unregistered");
        self.publish(FormEvent::FieldUnregistered {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> FormResult<bool> {
        Ok(read_lock(&self.state, "checking field registration")?.is_registered(name))
    }

    pub fn registered_fields(&self) -> FormResult<Vec<String>> {
        Ok(read_lock(&self.state, "listing registered fields")?.registered_names())
    }

    pub fn get_field(&self, name: &str) -> FormResult<Option<FieldInfo>> {
        Ok(read_lock(&self.state, "reading field")?.field_info(name))
    }

    pub fn fields(&self) -> FormResult<Vec<FieldInfo>> {
        Ok(read_lock(&self.state, "reading fields")?.registered_infos())
    }

    pub fn update_field(&self, name: &str, update: FieldUpdate) -> FormResult<()> {
        let value_changed = update.value.is_some();
        {
            let mut state = write_lock(&self.state, "updating field")?;
            if let Some(value) = update.value {
                state.values.insert(name.to_string(), value);
            }
            let entry = state.ensure_entry(name);
            if let Some(errors) = update.errors {
                entry.errors = errors;
            }
            if let Some(touched) = update.touched {
                entry.touched = touched;
            }
            if let Some(validating) = update.validating {
                entry.validating = validating;
            }
            if let Some(rules) = update.rules {
                entry.rules = rules;
            }
        }
        let name = name.to_string();
        if value_changed {
            self.publish(FormEvent::ValueChanged { name: name.clone() });
        }
        self.publish(FormEvent::FieldChanged { name });
        Ok(())
    }

    pub fn set_field_value(&self, name: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        let (all_values, changed_field, all_fields) = {
            let mut state = write_lock(&self.state, "writing field value")?;
            state.values.insert(name.to_string(), value.clone());
            state.ensure_entry(name);
            let fields = self
                .callbacks
                .on_fields_change
                .is_some()
                .then(|| state.registered_infos());
            (state.values.clone(), state.field_info(name), fields)
        };

        if let Some(on_values_change) = &self.callbacks.on_values_change {
            let changed = FormValues::from([(name.to_string(), value)]);
            on_values_change(&changed, &all_values);
        }
        if let (Some(on_fields_change), Some(changed), Some(all)) = (
            &self.callbacks.on_fields_change,
            changed_field,
            all_fields,
        ) {
            on_fields_change(std::slice::from_ref(&changed), &all);
        }
        self.publish(FormEvent::ValueChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn get_field_value(&self, name: &str) -> FormResult<Option<FieldValue>> {
        Ok(read_lock(&self.state, "reading field value")?
            .values
            .get(name)
            .cloned())
    }

    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    /// Merges `values` into the current values.
    pub fn set_values(&self, values: FormValues) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "merging form values")?;
            state.values.extend(values);
        }
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn values_as<M>(&self) -> FormResult<M>
    where
        M: FormModel,
    {
        let values = self.values()?;
        M::from_values(&values)
    }

    pub fn set_model<M>(&self, model: &M) -> FormResult<()>
    where
        M: FormModel,
    {
        self.set_values(model.to_values())
    }

    pub fn set_field_error(&self, name: &str, errors: Vec<String>) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "writing field error")?;
            state.ensure_entry(name).errors = errors;
        }
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn get_field_error(&self, name: &str) -> FormResult<Vec<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .fields
            .get(name)
            .map(|entry| entry.errors.clone())
            .unwrap_or_default())
    }

    pub fn errors(&self) -> FormResult<FormErrors> {
        Ok(read_lock(&self.state, "reading form errors")?.errors())
    }

    /// Merges `errors` into the current errors.
    pub fn set_errors(&self, errors: FormErrors) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "merging form errors")?;
            for (name, messages) in errors {
                state.ensure_entry(&name).errors = messages;
            }
        }
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn clear_errors(&self, names: Option<&[&str]>) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "clearing field errors")?;
            match names {
                Some(names) => {
                    for name in names {
                        if let Some(entry) = state.fields.get_mut(*name) {
                            entry.errors.clear();
                        }
                    }
                }
                None => {
                    for entry in state.fields.values_mut() {
                        entry.errors.clear();
                    }
                }
            }
        }
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn set_field_touched(&self, name: &str, touched: bool) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "writing touched flag")?;
            let entry = state.ensure_entry(name);
            if entry.touched == touched {
                return Ok(());
            }
            entry.touched = touched;
        }
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn set_field_validating(&self, name: &str, validating: bool) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "writing validating flag")?;
            state.ensure_entry(name).validating = validating;
        }
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Resets one registered field to its declared default; unknown names are ignored.
    pub fn reset_field(&self, name: &str) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "resetting field")?;
            if !state.is_registered(name) {
                return Ok(());
            }
            state.reset_entry(name);
        }
        self.publish(FormEvent::ValueChanged {
            name: name.to_string(),
        });
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn add_field_rules(&self, name: &str, rules: Vec<Rule>) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "adding field rules")?;
            state.rules.entry(name.to_string()).or_default().extend(rules);
        }
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn remove_field_rules(&self, name: &str) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "removing field rules")?;
            state.rules.insert(name.to_string(), Vec::new());
            if let Some(entry) = state.fields.get_mut(name) {
                entry.rules.clear();
            }
        }
        self.publish(FormEvent::FieldChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Form-level rules followed by the rules the field registered with.
    pub fn field_rules(&self, name: &str) -> FormResult<Vec<Rule>> {
        Ok(read_lock(&self.state, "reading field rules")?.effective_rules(name))
    }

    pub fn set_status(&self, status: FormStatus) -> FormResult<()> {
        write_lock(&self.state, "writing form status")?.status = status;
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn status(&self) -> FormResult<FormStatus> {
        Ok(read_lock(&self.state, "reading form status")?.status)
    }

    pub fn set_disabled(&self, disabled: bool) -> FormResult<()> {
        write_lock(&self.state, "writing disabled flag")?.disabled = disabled;
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn set_readonly(&self, readonly: bool) -> FormResult<()> {
        write_lock(&self.state, "writing readonly flag")?.readonly = readonly;
        self.publish(FormEvent::FormChanged);
        Ok(())
    }

    pub fn is_disabled(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading disabled flag")?.disabled)
    }

    pub fn is_readonly(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading readonly flag")?.readonly)
    }

    pub fn register_scroll_handler(
        &self,
        name: impl Into<String>,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> FormResult<()> {
        let mut handlers = write_lock(&self.scroll_handlers, "registering scroll handler")?;
        handlers.insert(name.into(), Arc::new(handler));
        Ok(())
    }

    /// Runs the host's scroll handler for `name`. Returns false when none is registered.
    pub fn scroll_to_field(&self, name: &str) -> FormResult<bool> {
        let handler = read_lock(&self.scroll_handlers, "reading scroll handlers")?
            .get(name)
            .cloned();
        match handler {
            Some(handler) => {
                handler();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn instance(&self) -> FormResult<FormInstance> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let fields = state
            .registered_names()
            .into_iter()
            .filter_map(|name| state.field_info(&name).map(|info| (name, info)))
            .collect();
        Ok(FormInstance {
            id: state.id,
            values: state.values.clone(),
            errors: state.errors(),
            touched: state
                .fields
                .iter()
                .map(|(name, entry)| (name.clone(), entry.touched))
                .collect(),
            validating: state
                .fields
                .iter()
                .map(|(name, entry)| (name.clone(), entry.validating))
                .collect(),
            fields,
            rules: state.rules.clone(),
            status: state.status,
            disabled: state.disabled,
            readonly: state.readonly,
            submit_state: state.submit_state,
            submit_count: state.submit_count,
        })
    }
}

pub(super) fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
