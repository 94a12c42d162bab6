use super::*;
use crate::phase::LayoutPhase;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;
use waterfall_core::{ManualClock, ScrollToOptions};
use waterfall_foundation::VirtualConfig;
use waterfall_plugin::{Plugin, PluginError};

const HEIGHTS: [f32; 10] = [
    100.0, 200.0, 150.0, 300.0, 100.0, 250.0, 180.0, 90.0, 220.0, 140.0,
];

#[derive(Default)]
struct TestMetrics {
    container: Cell<Option<Size>>,
    observed: RefCell<FxHashSet<usize>>,
}

impl TestMetrics {
    fn with_container(width: f32, height: f32) -> Rc<Self> {
        let metrics = Rc::new(Self::default());
        metrics.container.set(Some(Size::new(width, height)));
        metrics
    }
}

impl BoxMetrics for TestMetrics {
    fn container_size(&self) -> Option<Size> {
        self.container.get()
    }

    fn item_size(&self, _index: usize) -> Option<Size> {
        None
    }

    fn observe_item(&self, index: usize) -> bool {
        self.observed.borrow_mut().insert(index);
        true
    }

    fn unobserve_item(&self, index: usize) {
        self.observed.borrow_mut().remove(&index);
    }
}

struct Gate(Rc<Cell<Option<bool>>>);

impl Future for Gate {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<bool> {
        match self.0.get() {
            Some(answer) => Poll::Ready(answer),
            None => Poll::Pending,
        }
    }
}

fn scenario_props() -> WaterfallProps<f32> {
    WaterfallProps::new(HEIGHTS.to_vec())
        .columns(3)
        .gap(10.0)
        .item_height(|height: &f32, _| *height)
        .virtualization(Some(VirtualConfig::default().with_overscan(0.0)))
}

fn composition(
    props: WaterfallProps<f32>,
    metrics: Rc<TestMetrics>,
) -> (Waterfall<f32>, ManualClock) {
    let clock = ManualClock::new();
    let waterfall = Waterfall::new(props, metrics).with_clock(Rc::new(clock.clone()));
    (waterfall, clock)
}

fn scroll_to(waterfall: &mut Waterfall<f32>, top: f32) {
    waterfall.notify_scroll(ScrollMetrics {
        scroll_top: top,
        scroll_height: 690.0,
        client_height: 400.0,
        client_width: 320.0,
        ..Default::default()
    });
}

#[test]
fn test_mount_lays_out_scenario() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.mount();
    assert_eq!(waterfall.phase(), LayoutPhase::Requested);
    assert!(waterfall.pump());
    assert_eq!(waterfall.layout_count(), 1);
    assert_eq!(waterfall.phase(), LayoutPhase::Idle);

    let columns: Vec<usize> = (0..10)
        .map(|i| waterfall.item_position(i).map_or(usize::MAX, |p| p.column))
        .collect();
    assert_eq!(columns, vec![0, 1, 2, 0, 2, 1, 2, 0, 2, 1]);
    assert_eq!(waterfall.column_heights().as_slice(), &[520.0, 620.0, 690.0]);
    assert_eq!(waterfall.layout_info().total_height, 690.0);

    let p8 = waterfall.item_position(8).unwrap();
    assert_eq!((p8.x, p8.y, p8.height), (220.0, 460.0, 220.0));
    let p9 = waterfall.item_position(9).unwrap();
    assert_eq!((p9.x, p9.y, p9.row), (110.0, 470.0, 3));
}

#[test]
fn test_placeholder_without_container() {
    let metrics = Rc::new(TestMetrics::default());
    let (mut waterfall, _clock) =
        composition(WaterfallProps::new(HEIGHTS.to_vec()), Rc::clone(&metrics));
    waterfall.mount();
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 0);

    let frame = waterfall.frame();
    assert!(frame.placeholder);
    assert!(frame.is_empty());
    // ceil(10 / 3) rows of (200 estimate + 16 gap)
    assert_eq!(frame.total_height, 4.0 * 216.0);

    metrics.container.set(Some(Size::new(648.0, 400.0)));
    waterfall.notify_container_resize();
    waterfall.relayout();
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);
    assert!(!waterfall.frame().placeholder);
}

#[test]
fn test_windowing_matches_band() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 500.0);

    let frame = waterfall.frame();
    assert_eq!(frame.indices(), vec![7, 8, 9]);
    let positions = waterfall.all_item_positions();
    for (index, position) in positions.iter() {
        let expected = position.bottom() > 500.0 && position.y < 900.0;
        assert_eq!(frame.indices().contains(&index), expected, "item {index}");
    }
}

#[test]
fn test_debounce_coalesces_replacements() {
    let (mut waterfall, clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.mount();
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);

    for step in 0..5 {
        let mut items = HEIGHTS.to_vec();
        items.push(100.0 + step as f32);
        waterfall.set_items(items);
        waterfall.pump();
        clock.advance_millis(10);
    }
    assert_eq!(waterfall.layout_count(), 1);

    // Last replacement was at 40ms; the window closes at 190ms.
    clock.advance_millis(139);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);
    clock.advance_millis(1);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 2);
    assert_eq!(waterfall.all_item_positions().len(), 11);

    clock.advance_millis(1000);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 2);
}

#[test]
fn test_veto_keeps_previous_layout() {
    let (mut waterfall, clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.mount();
    waterfall.pump();
    let committed = waterfall.layout_info();

    let allow = Rc::new(Cell::new(false));
    {
        let allow = Rc::clone(&allow);
        waterfall.register_plugin(
            Plugin::new("gate").veto(Hook::BeforeLayout, move |_, _| Ok(allow.get())),
        );
    }
    waterfall.set_items(vec![50.0; 4]);
    clock.advance_millis(150);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);
    assert!(Rc::ptr_eq(&committed, &waterfall.layout_info()));
    assert_eq!(waterfall.phase(), LayoutPhase::Idle);

    allow.set(true);
    waterfall.relayout();
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 2);
    assert_eq!(waterfall.all_item_positions().len(), 4);
}

#[test]
fn test_async_veto_suspends_and_coalesces() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    let gate = Rc::new(Cell::new(None));
    {
        let gate = Rc::clone(&gate);
        waterfall.register_plugin(
            Plugin::new("confirm").veto_async(Hook::BeforeLayout, move |_, _| Gate(Rc::clone(&gate))),
        );
    }
    waterfall.mount();
    waterfall.pump();
    assert_eq!(waterfall.phase(), LayoutPhase::AwaitingVeto);
    assert!(waterfall.context().flags.is_layouting);

    waterfall.pump();
    assert_eq!(waterfall.phase(), LayoutPhase::AwaitingVeto);
    waterfall.relayout();
    assert_eq!(waterfall.phase(), LayoutPhase::AwaitingVeto);

    gate.set(Some(true));
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);
    assert_eq!(waterfall.phase(), LayoutPhase::Idle);
    // The request that arrived mid-flight comes back through the debounce.
    assert!(waterfall.next_deadline().is_some());
}

#[test]
fn test_async_veto_can_cancel_pass() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.register_plugin(
        Plugin::new("deny").veto_async(Hook::BeforeLayout, |_, _| async { false }),
    );
    waterfall.mount();
    waterfall.pump();
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 0);
    assert_eq!(waterfall.phase(), LayoutPhase::Idle);
}

#[test]
fn test_column_overrides_apply() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.register_plugin(Plugin::new("two").calculate_columns(|_| Some(2)));
    waterfall.register_plugin(
        Plugin::new("narrow").calculate_column_width(|_, _, _| Some(80.0)),
    );
    waterfall.mount();
    waterfall.pump();
    let layout = waterfall.layout_info();
    assert_eq!(layout.columns, 2);
    assert_eq!(layout.column_width, 80.0);
    assert_eq!(waterfall.item_position(1).map(|p| p.x), Some(90.0));
}

#[test]
fn test_plugin_errors_reach_error_hook() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    let reported: Rc<RefCell<Vec<String>>> = Rc::default();
    waterfall.register_plugin(
        Plugin::new("broken").notify(Hook::Scroll, |_, _| Err(PluginError::msg("boom"))),
    );
    {
        let reported = Rc::clone(&reported);
        waterfall.register_plugin(Plugin::new("reporter").notify(Hook::Error, move |_, args| {
            if let HookArgs::Error(error) = args {
                reported.borrow_mut().push(error.to_string());
            }
            Ok(())
        }));
    }
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 10.0);
    assert_eq!(
        *reported.borrow(),
        vec!["plugin `broken` failed in scroll: boom".to_string()]
    );
    // The composition keeps working.
    assert_eq!(waterfall.viewport_info().scroll_top, 10.0);
}

#[test]
fn test_measured_height_triggers_recompute() {
    let metrics = TestMetrics::with_container(320.0, 400.0);
    let (mut waterfall, clock) = composition(scenario_props(), Rc::clone(&metrics));
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 500.0);
    waterfall.frame();
    assert!(metrics.observed.borrow().contains(&8));

    waterfall.notify_item_resize(8, Size::new(100.0, 260.0));
    waterfall.notify_item_resize(9, Size::new(100.0, 160.0));
    clock.advance_millis(49);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 1);
    clock.advance_millis(1);
    waterfall.pump();
    assert_eq!(waterfall.layout_count(), 2);

    let p8 = waterfall.item_position(8).unwrap();
    assert_eq!((p8.column, p8.height), (2, 260.0));
    assert_eq!(waterfall.item_position(9).map(|p| p.height), Some(160.0));
}

#[test]
fn test_frame_emits_mount_diffs() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    let mounted: Rc<RefCell<Vec<(bool, usize)>>> = Rc::default();
    for (hook, flag) in [(Hook::ItemMount, true), (Hook::ItemUnmount, false)] {
        let mounted = Rc::clone(&mounted);
        waterfall.register_plugin(Plugin::new(format!("{hook}")).notify(hook, move |_, args| {
            if let Some(index) = args.index() {
                mounted.borrow_mut().push((flag, index));
            }
            Ok(())
        }));
    }
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 500.0);
    waterfall.frame();
    scroll_to(&mut waterfall, 0.0);
    waterfall.frame();

    let events = mounted.borrow();
    assert_eq!(&events[..3], &[(true, 7), (true, 8), (true, 9)]);
    assert!(events.contains(&(false, 8)));
    assert!(events.contains(&(true, 0)));
}

#[test]
fn test_scroll_requests_are_queued() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 0.0);

    assert_eq!(
        waterfall.scroll_to_item(42, ScrollToOptions::default()),
        Err(WaterfallError::UnknownItem(42))
    );
    waterfall
        .scroll_to_item(8, ScrollToOptions::default().with_offset(-10.0))
        .unwrap();
    waterfall.scroll_to_bottom(ScrollToOptions::smooth());
    let requests = waterfall.take_scroll_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].top, 450.0);
    assert_eq!(requests[1].top, 290.0);
    assert!(waterfall.take_scroll_requests().is_empty());
}

#[test]
fn test_plugin_actions_are_applied_after_dispatch() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.register_plugin(Plugin::new("clicker").notify(Hook::ItemClick, |ctx, _| {
        ctx.actions.scroll_to_top(ScrollToOptions::default());
        ctx.actions.force_update();
        Ok(())
    }));
    waterfall.mount();
    waterfall.pump();
    waterfall.item_click(3).unwrap();
    assert_eq!(waterfall.take_scroll_requests().len(), 1);
    assert_eq!(waterfall.render_version(), 1);
    assert_eq!(waterfall.item_click(99), Err(WaterfallError::UnknownItem(99)));
}

#[test]
fn test_items_change_async_veto() {
    let (mut waterfall, clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    let gate = Rc::new(Cell::new(None));
    {
        let gate = Rc::clone(&gate);
        waterfall.register_plugin(
            Plugin::new("confirm")
                .veto_async(Hook::BeforeItemsChange, move |_, _| Gate(Rc::clone(&gate))),
        );
    }
    waterfall.mount();
    waterfall.pump();

    waterfall.set_items(vec![10.0, 20.0]);
    assert!(waterfall.has_pending_items_change());
    assert_eq!(waterfall.items().len(), 10);

    gate.set(Some(false));
    waterfall.pump();
    assert!(!waterfall.has_pending_items_change());
    assert_eq!(waterfall.items().len(), 10);

    gate.set(None);
    waterfall.set_items(vec![10.0, 20.0]);
    gate.set(Some(true));
    waterfall.pump();
    assert_eq!(waterfall.items(), &[10.0, 20.0]);
    clock.advance_millis(150);
    waterfall.pump();
    assert_eq!(waterfall.all_item_positions().len(), 2);
}

#[test]
fn test_selection_and_filter_hooks() {
    let (mut waterfall, _clock) = composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    waterfall.register_plugin(
        Plugin::new("tall_only").veto(Hook::FilterItem, |_, args| match args {
            HookArgs::FilterItem { item, .. } => Ok(**item >= 200.0),
            _ => Ok(true),
        }),
    );
    waterfall.mount();
    assert_eq!(waterfall.items(), &[200.0, 300.0, 250.0, 220.0]);

    waterfall.select_item(2, true);
    waterfall.select_item(0, true);
    waterfall.select_item(2, false);
    assert_eq!(waterfall.selected_items(), &[0]);
}

#[test]
fn test_unrelated_props_keep_filtered_list_state() {
    let (mut waterfall, clock) =
        composition(scenario_props(), TestMetrics::with_container(320.0, 400.0));
    let items_changes = Rc::new(Cell::new(0));
    {
        let items_changes = Rc::clone(&items_changes);
        waterfall.register_plugin(
            Plugin::new("tall_reversed")
                .veto(Hook::FilterItem, |_, args| match args {
                    HookArgs::FilterItem { item, .. } => Ok(**item >= 200.0),
                    _ => Ok(true),
                })
                .on(Hook::SortItems, |_, args| match args {
                    HookArgs::SortItems { items } => {
                        Ok(HookValue::Order((0..items.len()).rev().collect()))
                    }
                    _ => Ok(HookValue::None),
                })
                .notify(Hook::ItemsChange, move |_, _| {
                    items_changes.set(items_changes.get() + 1);
                    Ok(())
                }),
        );
    }
    waterfall.mount();
    waterfall.pump();
    assert_eq!(waterfall.items(), &[220.0, 250.0, 300.0, 200.0]);

    scroll_to(&mut waterfall, 0.0);
    waterfall.frame();
    waterfall.notify_item_resize(0, Size::new(100.0, 333.0));
    clock.advance_millis(50);
    waterfall.pump();
    assert_eq!(waterfall.item_position(0).map(|p| p.height), Some(333.0));

    let mut loading = waterfall.source_props().clone();
    loading.is_loading = true;
    waterfall.set_props(loading);
    waterfall.register_plugin(Plugin::new("bystander"));
    clock.advance_millis(150);
    waterfall.pump();

    assert_eq!(items_changes.get(), 0);
    assert_eq!(waterfall.item_position(0).map(|p| p.height), Some(333.0));
}

#[test]
fn test_destroy_releases_everything() {
    let metrics = TestMetrics::with_container(320.0, 400.0);
    let (mut waterfall, _clock) = composition(scenario_props(), Rc::clone(&metrics));
    let unmounted = Rc::new(Cell::new(false));
    {
        let unmounted = Rc::clone(&unmounted);
        waterfall.register_plugin(Plugin::new("watch").notify(Hook::Unmount, move |_, _| {
            unmounted.set(true);
            Ok(())
        }));
    }
    waterfall.mount();
    waterfall.pump();
    scroll_to(&mut waterfall, 0.0);
    waterfall.frame();
    assert!(!metrics.observed.borrow().is_empty());

    waterfall.destroy();
    assert!(unmounted.get());
    assert!(metrics.observed.borrow().is_empty());
    assert!(waterfall.plugin_names().is_empty());
    assert!(!waterfall.is_mounted());
}
