use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::FormEvent;
use super::controller::{
    FieldInfo, FormController, FormError, FormResult, FormStatus, SubmitState, read_lock,
    transition_submit_state, write_lock,
};
use super::value::{FormErrors, FormValues};

/// Error returned by a submit callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type SubmitFuture = Pin<Box<dyn Future<Output = Result<(), CallbackError>> + Send>>;

type SubmitCallback = Arc<dyn Fn(FormValues, ActionSource) -> SubmitFuture + Send + Sync>;
type ResetCallback = Arc<dyn Fn(&FormValues, ActionSource) + Send + Sync>;
type ValuesChangeCallback = Arc<dyn Fn(&FormValues, &FormValues) + Send + Sync>;
type FieldsChangeCallback = Arc<dyn Fn(&[FieldInfo], &[FieldInfo]) + Send + Sync>;
type FinishFailedCallback = Arc<dyn Fn(&FormErrors, &FormValues) + Send + Sync>;

/// Who started a submit or reset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionSource {
    /// A form submit/reset interaction.
    User,
    /// A programmatic call through [`FormHandle`](super::FormHandle).
    Handle,
}

#[derive(Clone, Default)]
pub struct FormCallbacks {
    pub(super) on_submit: Option<SubmitCallback>,
    pub(super) on_reset: Option<ResetCallback>,
    pub(super) on_values_change: Option<ValuesChangeCallback>,
    pub(super) on_fields_change: Option<FieldsChangeCallback>,
    pub(super) on_finish_failed: Option<FinishFailedCallback>,
}

impl FormCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_submit<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(FormValues, ActionSource) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let wrapped: SubmitCallback =
            Arc::new(move |values: FormValues, source: ActionSource| -> SubmitFuture {
                Box::pin(callback(values, source))
            });
        self.on_submit = Some(wrapped);
        self
    }

    pub fn on_reset(
        mut self,
        callback: impl Fn(&FormValues, ActionSource) + Send + Sync + 'static,
    ) -> Self {
        self.on_reset = Some(Arc::new(callback));
        self
    }

    /// Called with the changed values and all values after each value write.
    pub fn on_values_change(
        mut self,
        callback: impl Fn(&FormValues, &FormValues) + Send + Sync + 'static,
    ) -> Self {
        self.on_values_change = Some(Arc::new(callback));
        self
    }

    /// Called with the changed field and all registered fields after each value write.
    pub fn on_fields_change(
        mut self,
        callback: impl Fn(&[FieldInfo], &[FieldInfo]) + Send + Sync + 'static,
    ) -> Self {
        self.on_fields_change = Some(Arc::new(callback));
        self
    }

    pub fn on_finish_failed(
        mut self,
        callback: impl Fn(&FormErrors, &FormValues) + Send + Sync + 'static,
    ) -> Self {
        self.on_finish_failed = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for FormCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormCallbacks")
            .field("on_submit", &self.on_submit.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .field("on_values_change", &self.on_values_change.is_some())
            .field("on_fields_change", &self.on_fields_change.is_some())
            .field("on_finish_failed", &self.on_finish_failed.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// At least one registered field failed validation; `on_submit` was not called.
    Invalid(FormErrors),
    /// `on_submit` returned an error.
    CallbackFailed(String),
    Success(FormValues),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Success(_))
    }
}

impl FormController {
    /// Validates every registered field concurrently and hands the values to
    /// `on_submit` when all of them pass.
    ///
    /// A failing `on_submit` is logged and reported as
    /// [`SubmitOutcome::CallbackFailed`]; it is not an `Err`.
    pub async fn handle_submit(&self, source: ActionSource) -> FormResult<SubmitOutcome> {
        let outcome = self.run_submit(source).await?;
        if let SubmitOutcome::CallbackFailed(message) = &outcome {
            tracing::error!(error = %message, "form submit callback failed");
        }
        Ok(outcome)
    }

    pub(super) async fn run_submit(&self, source: ActionSource) -> FormResult<SubmitOutcome> {
        self.begin_submit()?;
        let errors = match self.validate(None).await {
            Ok(errors) => errors,
            Err(error) => {
                self.abort_submit();
                return Err(error);
            }
        };
        let values = self.values()?;

        if !errors.is_empty() {
            {
                let mut state = write_lock(&self.state, "failing form submit")?;
                transition_submit_state(&mut state, SubmitState::Failed)?;
                state.status = FormStatus::Error;
            }
            tracing::debug!(failed = errors.len(), "form submit blocked by validation");
            self.publish(FormEvent::FormChanged);
            self.publish(FormEvent::Submitted { valid: false });
            if let Some(on_finish_failed) = &self.callbacks.on_finish_failed {
                on_finish_failed(&errors, &values);
            }
            if self.options.scroll_to_first_error {
                if let Some(first) = errors.keys().next() {
                    self.scroll_to_field(first)?;
                }
            }
            return Ok(SubmitOutcome::Invalid(errors));
        }

        {
            let mut state = write_lock(&self.state, "starting form submit")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.status = FormStatus::Loading;
        }
        self.publish(FormEvent::FormChanged);

        let result = match &self.callbacks.on_submit {
            Some(on_submit) => on_submit(values.clone(), source).await,
            None => Ok(()),
        };

        let (next, status) = match &result {
            Ok(()) => (SubmitState::Succeeded, FormStatus::Success),
            Err(_) => (SubmitState::Failed, FormStatus::Error),
        };
        {
            let mut state = write_lock(&self.state, "finishing form submit")?;
            transition_submit_state(&mut state, next)?;
            state.status = status;
        }
        self.publish(FormEvent::FormChanged);
        self.publish(FormEvent::Submitted { valid: true });

        Ok(match result {
            Ok(()) => SubmitOutcome::Success(values),
            Err(error) => SubmitOutcome::CallbackFailed(error.to_string()),
        })
    }

    /// Puts every registered field back to its declared default, drops the values of
    /// unregistered names, then calls `on_reset` with the resulting values.
    pub fn handle_reset(&self, source: ActionSource) -> FormResult<FormValues> {
        let values = {
            let mut state = write_lock(&self.state, "resetting form")?;
            state.values.clear();
            state.tickets.clear();
            state.fields.retain(|_, entry| entry.registered);
            for name in state.registered_names() {
                state.reset_entry(&name);
            }
            if state.status != FormStatus::Loading {
                state.status = FormStatus::Normal;
            }
            if matches!(
                state.submit_state,
                SubmitState::Succeeded | SubmitState::Failed
            ) {
                transition_submit_state(&mut state, SubmitState::Idle)?;
            }
            state.values.clone()
        };
        tracing::debug!(?source, "form reset");
        self.publish(FormEvent::Reset);
        if let Some(on_reset) = &self.callbacks.on_reset {
            on_reset(&values, source);
        }
        Ok(values)
    }

    /// Resets `names`, or every registered field, without calling `on_reset`.
    pub fn reset_fields(&self, names: Option<&[&str]>) -> FormResult<()> {
        let names = match names {
            Some(names) => names.iter().map(|name| name.to_string()).collect(),
            None => self.registered_fields()?,
        };
        for name in names {
            self.reset_field(&name)?;
        }
        Ok(())
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    fn begin_submit(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "beginning form submit")?;
        if matches!(
            state.submit_state,
            SubmitState::Validating | SubmitState::Submitting
        ) {
            return Err(FormError::AlreadySubmitting);
        }
        transition_submit_state(&mut state, SubmitState::Validating)?;
        state.submit_count += 1;
        Ok(())
    }

    fn abort_submit(&self) {
        if let Ok(mut state) = write_lock(&self.state, "aborting form submit") {
            state.submit_state = SubmitState::Idle;
        }
    }
}
