mod context;
mod controller;
mod handle;
mod item;
mod rule;
mod submit;
mod validation;
mod value;


pub use context::{FormEvent, Subscription};
pub use controller::{
    FieldInfo, FieldRegistration, FieldStatus, FieldUpdate, FieldValidation, FormController,
    FormError, FormId, FormInstance, FormOptions, FormResult, FormStatus, RequiredMark,
    SubmitState, ValidateTrigger, ValidationTicket,
};
pub use handle::{FormHandle, SubmitError};
pub use item::{FieldView, FormItem, MountedField};
pub use rule::{BoxedVerdictFuture, Rule, ValidatorError, Verdict, rule_default};
pub use submit::{ActionSource, CallbackError, FormCallbacks, SubmitFuture, SubmitOutcome};
pub use unoui_form_derive::FormModel;
pub use validation::evaluate_rules;
pub use value::{FieldType, FieldValue, FormErrors, FormModel, FormValues, is_blank};
#[doc(hidden)]
pub use value::{read_model_field, write_model_field};
