use super::*;
use crate::bus::PluginBus;
use crate::hook::HookValue;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

type Log = Rc<RefCell<Vec<String>>>;

fn ctx() -> PluginContext<u32> {
    PluginContext::detached(WaterfallProps::new(vec![1, 2, 3]), PluginBus::new())
}

fn noop_cx() -> Context<'static> {
    Context::from_waker(futures_task::noop_waker_ref())
}

/// Future that resolves once the test opens it.
struct Gate(Rc<Cell<Option<bool>>>);

impl Future for Gate {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<bool> {
        match self.0.get() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

fn logging_veto(name: &str, priority: i32, answer: bool, log: &Log) -> Plugin<u32> {
    let log = Rc::clone(log);
    let label = name.to_owned();
    Plugin::new(name)
        .with_priority(priority)
        .veto(Hook::BeforeLayout, move |_, _| {
            log.borrow_mut().push(label.clone());
            Ok(answer)
        })
}

#[test]
fn test_priority_order_is_stable() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(Plugin::new("a"), &ctx);
    manager.register(Plugin::new("b").with_priority(10), &ctx);
    manager.register(Plugin::new("c"), &ctx);
    manager.register(Plugin::new("d").with_priority(10), &ctx);
    manager.register(Plugin::new("e").with_priority(-1), &ctx);
    assert_eq!(manager.names(), vec!["b", "d", "a", "c", "e"]);
}

#[test]
fn test_register_all_sorts_batch() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register_all(
        vec![
            Plugin::new("low").with_priority(1),
            Plugin::new("high").with_priority(9),
            Plugin::new("mid").with_priority(5),
        ],
        &ctx,
    );
    assert_eq!(manager.names(), vec!["high", "mid", "low"]);
}

#[test]
fn test_veto_stops_at_first_false() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let mut manager = PluginManager::new();
    manager.register(logging_veto("first", 10, true, &log), &ctx);
    manager.register(logging_veto("blocker", 5, false, &log), &ctx);
    manager.register(logging_veto("never", 0, true, &log), &ctx);

    match manager.dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None) {
        VetoOutcome::Vetoed { plugin } => assert_eq!(plugin, "blocker"),
        other => panic!("expected veto, got {other:?}"),
    }
    assert_eq!(*log.borrow(), vec!["first", "blocker"]);
}

#[test]
fn test_disabled_plugins_are_skipped() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let mut manager = PluginManager::new();
    manager.register(logging_veto("blocker", 5, false, &log), &ctx);
    assert!(manager.disable("blocker"));
    assert!(!manager.is_enabled("blocker"));
    assert!(manager
        .dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None)
        .is_allowed());
    assert!(log.borrow().is_empty());

    manager.enable("blocker");
    assert!(!manager
        .dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None)
        .is_allowed());
}

#[test]
fn test_override_first_defined_value_wins() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    let late_calls = Rc::new(Cell::new(0));
    manager.register(
        Plugin::new("abstains")
            .with_priority(20)
            .calculate_columns(|_| None),
        &ctx,
    );
    manager.register(
        Plugin::new("winner")
            .with_priority(10)
            .calculate_columns(|_| Some(4)),
        &ctx,
    );
    {
        let late_calls = Rc::clone(&late_calls);
        manager.register(
            Plugin::new("loser").calculate_columns(move |_| {
                late_calls.set(late_calls.get() + 1);
                Some(7)
            }),
            &ctx,
        );
    }
    match manager.dispatch_override(Hook::CalculateColumns, &ctx, &HookArgs::None) {
        Some(HookValue::Columns(columns)) => assert_eq!(columns, 4),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(late_calls.get(), 0);
}

#[test]
fn test_override_booleans_do_not_win() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("bool")
            .with_priority(1)
            .on(Hook::CalculateColumns, |_, _| Ok(HookValue::Bool(false))),
        &ctx,
    );
    manager.register(Plugin::new("two").calculate_columns(|_| Some(2)), &ctx);
    assert!(matches!(
        manager.dispatch_override(Hook::CalculateColumns, &ctx, &HookArgs::None),
        Some(HookValue::Columns(2))
    ));
}

#[test]
fn test_override_without_handlers_returns_none() {
    let ctx = ctx();
    let mut manager: PluginManager<u32> = PluginManager::new();
    assert!(manager
        .dispatch_override(Hook::CalculateColumns, &ctx, &HookArgs::None)
        .is_none());
}

#[test]
fn test_notification_error_is_isolated() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    let reached = Rc::new(Cell::new(false));
    manager.register(
        Plugin::new("broken")
            .with_priority(10)
            .notify(Hook::Scroll, |_, _| Err(PluginError::msg("boom"))),
        &ctx,
    );
    {
        let reached = Rc::clone(&reached);
        manager.register(
            Plugin::new("fine").notify(Hook::Scroll, move |_, _| {
                reached.set(true);
                Ok(())
            }),
            &ctx,
        );
    }
    manager.notify(Hook::Scroll, &ctx, &HookArgs::Scroll { top: 10.0, left: 0.0 });
    assert!(reached.get());

    let failures = manager.take_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].plugin, "broken");
    assert_eq!(failures[0].stage, "scroll");
    assert!(!manager.has_failures());
}

#[test]
fn test_transform_composes_in_order() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("double").transform_props(|mut props: WaterfallProps<u32>, _| {
            props.columns *= 2;
            Ok(props)
        }),
        &ctx,
    );
    manager.register(
        Plugin::new("add_one").transform_props(|mut props: WaterfallProps<u32>, _| {
            props.columns += 1;
            Ok(props)
        }),
        &ctx,
    );
    let props = WaterfallProps::new(vec![1u32]).columns(3);
    // add_one(double(3)) = 7, not double(add_one(3)) = 8
    let out = manager.transform_props(props, &TransformEnv::default());
    assert_eq!(out.columns, 7);
}

#[test]
fn test_failing_transform_keeps_input() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("broken").transform_props(|_: WaterfallProps<u32>, _| Err("nope".into())),
        &ctx,
    );
    manager.register(
        Plugin::new("gap").transform_props(|props: WaterfallProps<u32>, _| Ok(props.gap(4.0))),
        &ctx,
    );
    let out = manager.transform_props(WaterfallProps::new(vec![1u32]).columns(5), &TransformEnv::default());
    assert_eq!(out.columns, 5);
    assert_eq!(out.gap, 4.0);
    assert_eq!(manager.take_failures()[0].stage, "transform_props");
}

#[test]
fn test_async_veto_resumes_remaining_plugins() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let gate = Rc::new(Cell::new(None));
    let mut manager = PluginManager::new();
    {
        let gate = Rc::clone(&gate);
        manager.register(
            Plugin::new("slow")
                .with_priority(10)
                .veto_async(Hook::BeforeLayout, move |_, _| Gate(Rc::clone(&gate))),
            &ctx,
        );
    }
    manager.register(logging_veto("after", 0, true, &log), &ctx);

    let mut cx = noop_cx();
    let pending = match manager.dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None) {
        VetoOutcome::Pending(pending) => pending,
        other => panic!("expected pending, got {other:?}"),
    };
    assert_eq!(pending.plugin(), "slow");
    assert!(log.borrow().is_empty());

    let pending = match manager.resume_veto(pending, &ctx, &HookArgs::None, &mut cx) {
        VetoOutcome::Pending(pending) => pending,
        other => panic!("expected still pending, got {other:?}"),
    };
    gate.set(Some(true));
    assert!(manager
        .resume_veto(pending, &ctx, &HookArgs::None, &mut cx)
        .is_allowed());
    assert_eq!(*log.borrow(), vec!["after"]);
}

#[test]
fn test_async_veto_can_cancel() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("slow")
            .with_priority(10)
            .veto_async(Hook::BeforeLayout, |_, _| async { false }),
        &ctx,
    );
    manager.register(logging_veto("after", 0, true, &log), &ctx);

    let mut cx = noop_cx();
    let VetoOutcome::Pending(pending) =
        manager.dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None)
    else {
        panic!("expected pending");
    };
    match manager.resume_veto(pending, &ctx, &HookArgs::None, &mut cx) {
        VetoOutcome::Vetoed { plugin } => assert_eq!(plugin, "slow"),
        other => panic!("expected veto, got {other:?}"),
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn test_plugin_removed_while_suspended_is_skipped() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("slow")
            .with_priority(10)
            .veto_async(Hook::BeforeLayout, |_, _| async { true }),
        &ctx,
    );
    manager.register(logging_veto("removed", 5, false, &log), &ctx);
    manager.register(logging_veto("kept", 0, true, &log), &ctx);

    let VetoOutcome::Pending(pending) =
        manager.dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None)
    else {
        panic!("expected pending");
    };
    manager.unregister("removed");
    let mut cx = noop_cx();
    assert!(manager
        .resume_veto(pending, &ctx, &HookArgs::None, &mut cx)
        .is_allowed());
    assert_eq!(*log.borrow(), vec!["kept"]);
}

#[test]
fn test_check_treats_async_as_allowed() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("async").veto_async(Hook::FilterItem, |_, _| async { false }),
        &ctx,
    );
    let item = 1u32;
    assert!(manager.check(
        Hook::FilterItem,
        &ctx,
        &HookArgs::FilterItem {
            index: 0,
            item: &item
        }
    ));
}

#[test]
fn test_error_hook_stops_after_failure() {
    let ctx = ctx();
    let log: Log = Rc::default();
    let mut manager = PluginManager::new();
    for (name, priority, fails) in [("first", 3, false), ("second", 2, true), ("third", 1, false)] {
        let log = Rc::clone(&log);
        manager.register(
            Plugin::new(name)
                .with_priority(priority)
                .notify(Hook::Error, move |_, _| {
                    log.borrow_mut().push(name.to_owned());
                    if fails {
                        Err(PluginError::msg("error handler broke"))
                    } else {
                        Ok(())
                    }
                }),
            &ctx,
        );
    }
    let error = WaterfallError::InvalidConfiguration("columns".into());
    manager.report_error(&ctx, &error);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
    // Failures inside the error hook are not fed back into it.
    assert!(!manager.has_failures());
}

#[test]
fn test_render_collects_every_value() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("badge")
            .with_priority(1)
            .render(Hook::RenderOverlay, |_, _| Some(Rc::new("badge") as Rc<dyn Any>)),
        &ctx,
    );
    manager.register(Plugin::new("silent").render(Hook::RenderOverlay, |_, _| None), &ctx);
    manager.register(
        Plugin::new("footer").render(Hook::RenderOverlay, |_, _| Some(Rc::new(7u8) as Rc<dyn Any>)),
        &ctx,
    );
    let rendered = manager.collect(Hook::RenderOverlay, &ctx, &HookArgs::None);
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].downcast_ref::<&str>(), Some(&"badge"));
    assert_eq!(rendered[1].downcast_ref::<u8>(), Some(&7));
}

#[test]
fn test_unregister_runs_async_teardown() {
    let ctx = ctx();
    let torn_down = Rc::new(Cell::new(false));
    let mut manager = PluginManager::new();
    {
        let torn_down = Rc::clone(&torn_down);
        manager.register(
            Plugin::new("cache").on_destroy(move || async move {
                torn_down.set(true);
                Ok(())
            }),
            &ctx,
        );
    }
    manager.register(
        Plugin::new("flaky").on_destroy(|| async { Err(PluginError::msg("disk gone")) }),
        &ctx,
    );
    assert!(manager.unregister("cache"));
    assert!(!manager.unregister("cache"));
    manager.clear();
    assert!(manager.is_empty());
    assert_eq!(manager.pending_teardowns(), 2);

    let mut cx = noop_cx();
    assert!(manager.poll_teardowns(&mut cx));
    assert!(torn_down.get());
    assert_eq!(manager.pending_teardowns(), 0);
}

#[test]
fn test_registration_side_effects() {
    let ctx = ctx();
    let mut manager = PluginManager::new();
    manager.register(
        Plugin::new("needs_sort")
            .depends_on("sort")
            .on_init(|ctx: &PluginContext<u32>| {
                ctx.bus.set_data("initialized", true);
                Err(PluginError::msg("partial init"))
            }),
        &ctx,
    );
    // Missing dependency and failing init both leave the plugin registered.
    assert!(manager.contains("needs_sort"));
    assert_eq!(ctx.bus.get_data::<bool>("initialized"), Some(true));
    assert_eq!(manager.take_failures()[0].stage, "init");

    manager.register(Plugin::new("needs_sort").with_priority(3), &ctx);
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.get("needs_sort").map(|p| p.priority()), Some(3));
}
