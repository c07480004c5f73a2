use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::executor::block_on;
use rust_decimal::Decimal;

use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, FormModel)]
struct ApiSmokeForm {
    title: String,
    enabled: bool,
    amount: Decimal,
}

#[test]
fn prelude_exports_the_component_surface() {
    let _ = VirtualList::new(vec![1, 2, 3], VirtualListOptions::default());
    let _ = LazyOptions::default().strategy(LoadStrategy::Prefetch);
    let _ = ErrorBoundary::new().log(ErrorLog::in_memory());
    let _ = ItemHeight::dynamic(|index| index as f32);
    let _ = I18nManager::with_locale(Locale::Tag("en-US".to_string()));
    let _ = crate::form::FormStatus::Normal;
    let _ = crate::components::ListContent::Items { loading_more: false };
    let _ = crate::feedback::MAX_ERROR_LOG_ENTRIES;
}

#[test]
fn form_public_api_smoke_runs() {
    let submitted = Arc::new(AtomicUsize::new(0));
    let counter = submitted.clone();
    let controller = FormController::with_callbacks(
        FormOptions::default()
            .locale("en-US")
            .validate_trigger(ValidateTrigger::OnChange)
            .initial_value("enabled", false)
            .initial_value("amount", Decimal::from_i128_with_scale(500, 2)),
        FormCallbacks::new().on_submit(move |_values, _source| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }),
    );

    let title = FormItem::new("title")
        .label("Title")
        .rule(Rule::required())
        .mount(&controller)
        .expect("mount title");
    for name in ["enabled", "amount"] {
        controller
            .register_field(name, Default::default())
            .expect("register field");
    }

    block_on(title.handle_change("")).expect("change title");
    assert_eq!(
        title.view().expect("view").error_message.as_deref(),
        Some("This field is required")
    );

    block_on(title.handle_change("draft")).expect("change title");
    let values = block_on(FormHandle::submit(&controller)).expect("submit");
    assert_eq!(values.get("title"), Some(&FieldValue::from("draft")));
    assert_eq!(submitted.load(Ordering::SeqCst), 1);

    let model = controller.values_as::<ApiSmokeForm>().expect("typed values");
    assert_eq!(
        model,
        ApiSmokeForm {
            title: "draft".to_string(),
            enabled: false,
            amount: Decimal::from_i128_with_scale(500, 2),
        }
    );

    controller.reset_fields(None).expect("reset");
    let error = block_on(FormHandle::submit(&controller)).expect_err("title is required");
    assert!(matches!(error, SubmitError::Invalid(_)));
}
