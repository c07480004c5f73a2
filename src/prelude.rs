pub use crate::components::{
    ErrorBoundary, ItemHeight, LazyLoader, LazyOptions, LazySlot, LoadStrategy, Rendered,
    VirtualList, VirtualListOptions,
};
pub use crate::feedback::{ErrorLog, LogKind};
pub use crate::form::{
    FieldValue, FormCallbacks, FormController, FormError, FormHandle, FormItem, FormModel,
    FormOptions, FormResult, FormValues, Rule, SubmitError, SubmitOutcome, ValidateTrigger,
};
pub use crate::{I18nManager, Locale};
