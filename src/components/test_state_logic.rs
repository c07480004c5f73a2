use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::executor::block_on;

use super::error_boundary::{ErrorBoundary, Rendered};
use super::lazy::{
    ComponentCache, ImportError, LazyError, LazyLoader, LazyOptions, LazySlot, LoadStrategy,
    SlotState, lazy_batch,
};
use super::virtual_list::{ItemHeight, ListContent, VirtualList, VirtualListOptions, VisibleRange};
use crate::feedback::{ErrorLog, LogKind};
use crate::i18n::I18nManager;

fn fixed_list(len: usize) -> VirtualList<usize> {
    VirtualList::new(
        (0..len).collect(),
        VirtualListOptions::new(200.0, ItemHeight::Fixed(50.0)),
    )
}

fn quick_retry(retry_count: u32) -> LazyOptions {
    LazyOptions::default()
        .retry_count(retry_count)
        .retry_delay(Duration::from_millis(1))
}

/// Import that fails until it has been called `failures` times.
fn flaky_loader(failures: u32, calls: Arc<AtomicU32>) -> LazyLoader<&'static str> {
    LazyLoader::new("Chart", move || {
        let calls = calls.clone();
        async move {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= failures {
                Err::<&'static str, ImportError>(format!("chunk missing {attempt}").into())
            } else {
                Ok("chart")
            }
        }
    })
}

#[test]
fn visible_range_covers_viewport_plus_overscan() {
    let mut list = fixed_list(100);
    assert_eq!(list.visible_range(), Some(VisibleRange { start: 0, end: 8 }));

    list.on_scroll(1_000.0);
    assert_eq!(
        list.visible_range(),
        Some(VisibleRange { start: 17, end: 28 })
    );

    let items = list.visible_items();
    assert_eq!(items.len(), 12);
    assert_eq!(items[0].index, 17);
    assert_eq!(items[0].top, 850.0);
    assert_eq!(*items[0].item, 17);
}

#[test]
fn visible_range_clamps_past_the_end() {
    let mut list = fixed_list(10);
    list.on_scroll(10_000.0);
    assert_eq!(list.visible_range(), Some(VisibleRange { start: 6, end: 9 }));

    let short = fixed_list(2);
    assert_eq!(short.visible_range(), Some(VisibleRange { start: 0, end: 1 }));
}

#[test]
fn invalid_viewport_heights_collapse_to_zero() {
    for height in [-200.0, f32::NAN, f32::INFINITY] {
        let mut list = VirtualList::new(
            (0..10).collect::<Vec<usize>>(),
            VirtualListOptions::new(height, ItemHeight::Fixed(50.0)).overscan(0),
        );
        assert_eq!(list.options().height, 0.0);

        list.on_scroll(300.0);
        let range = list.visible_range().expect("rows exist");
        assert_eq!(range, VisibleRange { start: 6, end: 7 });
        assert_eq!(range.count(), 2);
        assert_eq!(list.visible_items().len(), 2);
    }

    let options = VirtualListOptions {
        height: -1.0,
        ..VirtualListOptions::default()
    };
    let list = VirtualList::new(vec![1, 2, 3], options);
    assert_eq!(list.options().height, 0.0);
    assert!(!list.visible_items().is_empty());
}

#[test]
fn empty_list_has_no_range_and_reports_content_state() {
    let i18n = I18nManager::with_locale("zh-CN");
    let mut list: VirtualList<usize> = fixed_list(0);
    assert_eq!(list.visible_range(), None);
    assert!(list.visible_items().is_empty());
    assert_eq!(list.total_height(), 0.0);
    assert_eq!(list.content(&i18n), ListContent::Empty("暂无数据".to_string()));

    list.set_loading(true);
    assert_eq!(
        list.content(&i18n),
        ListContent::Loading("加载中...".to_string())
    );

    list.append_items([1, 2]);
    assert!(!list.is_loading());
    list.set_loading(true);
    assert_eq!(list.content(&i18n), ListContent::Items { loading_more: true });
}

#[test]
fn dynamic_heights_produce_cumulative_positions() {
    let list = VirtualList::new(
        vec!["a", "b", "c", "d"],
        VirtualListOptions::new(100.0, ItemHeight::dynamic(|index| 20.0 + index as f32 * 10.0)),
    );
    let tops: Vec<f32> = list.positions().iter().map(|position| position.top).collect();
    assert_eq!(tops, vec![0.0, 20.0, 50.0, 90.0]);
    assert_eq!(list.total_height(), 140.0);
    assert_eq!(list.item_position(2).map(|position| position.bottom), Some(90.0));
}

#[test]
fn measured_heights_shift_following_rows() {
    let mut list = fixed_list(5);
    assert!(list.update_item_height(1, 80.0));
    assert!(!list.update_item_height(1, 80.2));
    assert!(!list.update_item_height(9, 10.0));

    assert_eq!(list.item_position(2).map(|position| position.top), Some(130.0));
    assert_eq!(list.total_height(), 280.0);

    list.set_items((0..5).collect());
    assert_eq!(list.total_height(), 250.0);
}

#[test]
fn end_reached_respects_threshold_loading_and_has_more() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut list = fixed_list(10).on_end_reached(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!list.on_scroll(0.0));
    assert!(list.on_scroll(150.0));
    assert!(list.on_scroll(160.0));
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    list.set_loading(true);
    assert!(!list.on_scroll(170.0));
    list.set_loading(false);
    list.set_has_more(false);
    assert!(!list.on_scroll(180.0));
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn scroll_helpers_clamp_to_scrollable_range() {
    let offsets = Arc::new(Mutex::new(Vec::new()));
    let seen = offsets.clone();
    let mut list = fixed_list(10).on_scroll_callback(move |offset| {
        if let Ok(mut seen) = seen.lock() {
            seen.push(offset);
        }
    });

    assert_eq!(list.scroll_to_index(2), Some(100.0));
    assert_eq!(list.scroll_to_index(9), Some(300.0));
    assert_eq!(list.scroll_to_index(10), None);
    assert_eq!(list.scroll_to_position(-20.0), 0.0);
    assert_eq!(list.scroll_to_bottom(), 300.0);
    assert_eq!(list.scroll_to_top(), 0.0);

    let seen = offsets.lock().map(|seen| seen.clone()).unwrap_or_default();
    assert_eq!(seen, vec![100.0, 300.0, 0.0, 300.0, 0.0]);
}

#[test]
fn idle_timer_clears_scrolling_only_for_the_latest_scroll() {
    let mut list = VirtualList::new(
        (0..10).collect::<Vec<usize>>(),
        VirtualListOptions::new(200.0, ItemHeight::Fixed(50.0))
            .idle_delay(Duration::from_millis(5)),
    );
    assert!(!list.is_scrolling());

    list.on_scroll(40.0);
    let stale = list.idle_timer();
    list.on_scroll(80.0);
    block_on(stale);
    assert!(list.is_scrolling());

    block_on(list.idle_timer());
    assert!(!list.is_scrolling());
}

#[test]
fn lazy_load_retries_with_fixed_delay() {
    let calls = Arc::new(AtomicU32::new(0));
    let loader = flaky_loader(2, calls.clone()).options(quick_retry(3));

    let report = block_on(loader.load()).expect("third attempt succeeds");
    assert_eq!(report.value, "chart");
    assert_eq!(report.attempts, 3);
    assert_eq!(report.retry_delays, vec![Duration::from_millis(1); 2]);
    assert!(!report.cached);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn lazy_load_surfaces_the_last_error_after_all_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let loader = flaky_loader(u32::MAX, calls.clone()).options(quick_retry(3));

    let error = block_on(loader.load()).expect_err("every attempt fails");
    assert_eq!(
        error,
        LazyError::Exhausted {
            key: "Chart".to_string(),
            attempts: 3,
            last: "chunk missing 3".to_string(),
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(loader.cache().is_empty());
}

#[test]
fn zero_retry_count_still_attempts_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let loader = flaky_loader(u32::MAX, calls.clone()).options(quick_retry(0));

    let error = block_on(loader.load()).expect_err("single attempt fails");
    assert!(matches!(error, LazyError::Exhausted { attempts: 1, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn cached_components_skip_the_import() {
    let calls = Arc::new(AtomicU32::new(0));
    let loader = flaky_loader(0, calls.clone());

    assert!(!block_on(loader.load()).expect("loads").cached);
    let again = block_on(loader.load()).expect("cached");
    assert!(again.cached);
    assert_eq!(again.attempts, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    loader.cache().clear();
    block_on(loader.load()).expect("reloads");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let uncached_calls = Arc::new(AtomicU32::new(0));
    let uncached =
        flaky_loader(0, uncached_calls.clone()).options(LazyOptions::default().cache(false));
    block_on(uncached.load()).expect("loads");
    block_on(uncached.load()).expect("loads again");
    assert_eq!(uncached_calls.load(Ordering::SeqCst), 2);
    assert!(uncached.cache().is_empty());
}

#[test]
fn startup_task_follows_strategy_and_swallows_failures() {
    let lazy = flaky_loader(0, Arc::new(AtomicU32::new(0)));
    assert!(lazy.startup_task().is_none());

    let eager = flaky_loader(0, Arc::new(AtomicU32::new(0)))
        .options(LazyOptions::default().strategy(LoadStrategy::Eager));
    block_on(eager.startup_task().expect("eager preloads"));
    assert_eq!(eager.cache().get("Chart"), Some("chart"));

    let failing = flaky_loader(u32::MAX, Arc::new(AtomicU32::new(0)))
        .options(quick_retry(2).strategy(LoadStrategy::Prefetch));
    block_on(failing.startup_task().expect("prefetch preloads"));
    assert!(!failing.cache().contains("Chart"));
}

#[test]
fn lazy_batch_shares_options_and_cache() {
    let cache = ComponentCache::new();
    let loaders = lazy_batch(
        ["Table", "Tree"].into_iter().map(|key| {
            let import = move || async move { Ok::<String, ImportError>(key.to_lowercase()) };
            (key.to_string(), import)
        }),
        LazyOptions::default().retry_count(5),
        &cache,
    );

    assert_eq!(loaders.len(), 2);
    assert!(loaders.values().all(|loader| loader.lazy_options().retry_count == 5));
    for loader in loaders.values() {
        block_on(loader.load()).expect("loads");
    }
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("Tree"), Some("tree".to_string()));
}

#[test]
fn lazy_slot_shows_fallback_until_reset() {
    let i18n = I18nManager::with_locale("zh-CN");
    let calls = Arc::new(AtomicU32::new(0));
    let mut slot = LazySlot::new(flaky_loader(1, calls.clone()).options(quick_retry(1)));
    assert_eq!(slot.state(), &SlotState::Pending);

    assert!(matches!(block_on(slot.resolve()), SlotState::Failed(_)));
    let fallback = slot.fallback(&i18n).expect("failed slot has a fallback");
    assert_eq!(fallback.message, "组件加载失败");
    assert_eq!(fallback.retry_label, "重试");

    block_on(slot.resolve());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    slot.reset();
    assert_eq!(block_on(slot.resolve()), &SlotState::Ready("chart"));
    assert!(slot.fallback(&i18n).is_none());
}

#[test]
fn boundary_renders_fallback_and_reports_errors() {
    let log = ErrorLog::in_memory();
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let mut boundary = ErrorBoundary::new()
        .name("Profile")
        .i18n(I18nManager::with_locale("en-US"))
        .log(log.clone())
        .on_error(move |error| {
            if let Ok(mut sink) = sink.lock() {
                sink.push(error.message.clone());
            }
        });

    let rendered: Rendered<&str> = boundary.render(|| Err("avatar missing".into()));
    let Rendered::Fallback(fallback) = rendered else {
        panic!("expected fallback");
    };
    assert_eq!(fallback.title, "Something went wrong");
    assert_eq!(fallback.message, "avatar missing");
    assert_eq!(fallback.retry_label, "Retry");

    let caught = boundary.error().expect("error recorded");
    assert!(!caught.panicked);
    assert_eq!(caught.boundary.as_deref(), Some("Profile"));
    assert_eq!(
        reported.lock().map(|seen| seen.clone()).unwrap_or_default(),
        vec!["avatar missing".to_string()]
    );

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LogKind::Error);
    assert_eq!(entries[0].context.as_deref(), Some("Profile"));
}

#[test]
fn boundary_catches_panics() {
    let mut boundary = ErrorBoundary::new();
    let rendered: Rendered<()> = boundary.render(|| panic!("layout exploded"));
    assert!(rendered.is_fallback());
    let caught = boundary.error().expect("panic recorded");
    assert!(caught.panicked);
    assert_eq!(caught.message, "layout exploded");
}

#[test]
fn boundary_stays_on_fallback_until_reset() {
    let mut boundary = ErrorBoundary::new();
    let _ = boundary.render(|| Err::<(), _>("first".into()));

    let called = AtomicBool::new(false);
    let rendered = boundary.render(|| {
        called.store(true, Ordering::SeqCst);
        Ok(1)
    });
    assert!(rendered.is_fallback());
    assert!(!called.load(Ordering::SeqCst));

    boundary.reset();
    assert_eq!(boundary.render(|| Ok(2)), Rendered::Content(2));
    assert!(!boundary.has_error());
}

#[test]
fn changed_reset_keys_clear_the_error() {
    let mut boundary = ErrorBoundary::new();
    let _ = boundary.render_keyed(&["user-1"], || Err::<(), _>("not found".into()));
    assert!(boundary.render_keyed(&["user-1"], || Ok(())).is_fallback());
    assert_eq!(
        boundary.render_keyed(&["user-2"], || Ok("loaded")),
        Rendered::Content("loaded")
    );
}

#[test]
fn innermost_boundary_contains_the_failure() {
    let mut outer = ErrorBoundary::new().name("Page");
    let mut inner = ErrorBoundary::new().name("Widget");

    let rendered = outer.render(|| Ok(inner.render(|| Err::<(), _>("widget broke".into()))));
    let Rendered::Content(inner_rendered) = rendered else {
        panic!("outer boundary should render its content");
    };
    assert!(inner_rendered.is_fallback());
    assert!(!outer.has_error());
    assert_eq!(
        inner.error().and_then(|error| error.boundary.clone()),
        Some("Widget".to_string())
    );
}
