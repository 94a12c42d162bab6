//! Plugin registry and hook dispatch.
//!
//! Plugins are kept sorted by descending priority; equal priorities keep their
//! registration order. Every dispatch walks that order and combines results
//! according to the hook's [`HookClass`]. A handler error is logged, recorded
//! for the error extension point and never stops the dispatch, except inside
//! the error extension point itself.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::task::{Context, Poll};

use waterfall_core::WaterfallError;

use crate::context::PluginContext;
use crate::error::PluginError;
use crate::hook::{Hook, HookArgs, HookValue, VetoFuture};
use crate::plugin::{Plugin, TeardownFuture};
use crate::props::{TransformEnv, WaterfallProps};

/// A caught plugin error, waiting to be forwarded to the error extension point.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginFailure {
    pub plugin: String,
    /// Hook name, or `init` / `destroy`.
    pub stage: &'static str,
    pub error: PluginError,
}

impl PluginFailure {
    pub fn to_error(&self) -> WaterfallError {
        WaterfallError::Extension {
            plugin: self.plugin.clone(),
            hook: self.stage,
            message: self.error.to_string(),
        }
    }
}

/// Veto dispatch that is waiting on an asynchronous handler.
pub struct PendingVeto {
    hook: Hook,
    plugin: String,
    future: VetoFuture,
    remaining: VecDeque<String>,
}

impl PendingVeto {
    pub fn hook(&self) -> Hook {
        self.hook
    }

    /// Plugin whose decision is outstanding.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}

impl fmt::Debug for PendingVeto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingVeto")
            .field("hook", &self.hook)
            .field("plugin", &self.plugin)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum VetoOutcome {
    Allowed,
    Vetoed { plugin: String },
    Pending(PendingVeto),
}

impl VetoOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, VetoOutcome::Allowed)
    }
}

pub struct PluginManager<T> {
    plugins: Vec<Plugin<T>>,
    failures: Vec<PluginFailure>,
    teardowns: Vec<(String, TeardownFuture)>,
}

impl<T: 'static> Default for PluginManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> PluginManager<T> {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            failures: Vec::new(),
            teardowns: Vec::new(),
        }
    }

    /// Adds `plugin` in priority order and runs its initializer.
    ///
    /// A plugin with an already registered name replaces the old one, which is
    /// torn down. Missing dependencies are reported but do not block
    /// registration.
    pub fn register(&mut self, mut plugin: Plugin<T>, ctx: &PluginContext<T>) {
        if self.contains(plugin.name()) {
            log::warn!(
                "[waterfall] plugin `{}` is already registered; replacing it",
                plugin.name()
            );
            let name = plugin.name().to_owned();
            self.unregister(&name);
        }

        for dependency in plugin.dependencies() {
            if !self.contains(dependency) {
                log::warn!(
                    "[waterfall] plugin `{}` depends on `{}`, which is not registered",
                    plugin.name(),
                    dependency
                );
            }
        }

        if let Some(init) = plugin.take_init() {
            if let Err(error) = init(ctx) {
                record(&mut self.failures, plugin.name(), "init", error);
            }
        }

        let position = self
            .plugins
            .iter()
            .position(|existing| existing.priority() < plugin.priority())
            .unwrap_or(self.plugins.len());
        log::debug!(
            "[waterfall] registered plugin `{}` (priority {}) at {}",
            plugin.name(),
            plugin.priority(),
            position
        );
        self.plugins.insert(position, plugin);
    }

    /// Registers a batch, higher priorities first.
    pub fn register_all<I>(&mut self, plugins: I, ctx: &PluginContext<T>)
    where
        I: IntoIterator<Item = Plugin<T>>,
    {
        let mut plugins: Vec<Plugin<T>> = plugins.into_iter().collect();
        plugins.sort_by_key(|plugin| std::cmp::Reverse(plugin.priority()));
        for plugin in plugins {
            self.register(plugin, ctx);
        }
    }

    /// Removes `name` and schedules its teardown. Returns false if unknown.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(index) = self.plugins.iter().position(|p| p.name() == name) else {
            return false;
        };
        let mut plugin = self.plugins.remove(index);
        if let Some(destroy) = plugin.take_destroy() {
            self.teardowns.push((plugin.name().to_owned(), destroy()));
        }
        true
    }

    /// Unregisters every plugin.
    pub fn clear(&mut self) {
        let names: Vec<String> = self.names().into_iter().map(str::to_owned).collect();
        for name in names {
            self.unregister(&name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Plugin<T>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Plugin names in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.is_enabled())
    }

    /// True when any enabled plugin handles `hook`.
    pub fn handles(&self, hook: Hook) -> bool {
        self.plugins
            .iter()
            .any(|p| p.is_enabled() && p.has_hook(hook))
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.plugins.iter_mut().find(|p| p.name() == name) {
            Some(plugin) => {
                plugin.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Starts a veto-class dispatch.
    ///
    /// Stops at the first `false`. An asynchronous handler suspends the
    /// dispatch; continue it with [`PluginManager::resume_veto`].
    pub fn dispatch_veto(
        &mut self,
        hook: Hook,
        ctx: &PluginContext<T>,
        args: &HookArgs<'_, T>,
    ) -> VetoOutcome {
        let order: VecDeque<String> = self
            .plugins
            .iter()
            .filter(|p| p.is_enabled() && p.has_hook(hook))
            .map(|p| p.name().to_owned())
            .collect();
        self.run_veto(hook, order, ctx, args)
    }

    /// Polls a suspended veto and, once it resolves to true, continues with the
    /// plugins that had not run yet. Plugins disabled or removed in the
    /// meantime are skipped.
    pub fn resume_veto(
        &mut self,
        mut pending: PendingVeto,
        ctx: &PluginContext<T>,
        args: &HookArgs<'_, T>,
        cx: &mut Context<'_>,
    ) -> VetoOutcome {
        match pending.future.as_mut().poll(cx) {
            Poll::Pending => VetoOutcome::Pending(pending),
            Poll::Ready(false) => {
                log::debug!(
                    "[waterfall] {} vetoed asynchronously by `{}`",
                    pending.hook,
                    pending.plugin
                );
                VetoOutcome::Vetoed {
                    plugin: pending.plugin,
                }
            }
            Poll::Ready(true) => self.run_veto(pending.hook, pending.remaining, ctx, args),
        }
    }

    fn run_veto(
        &mut self,
        hook: Hook,
        mut order: VecDeque<String>,
        ctx: &PluginContext<T>,
        args: &HookArgs<'_, T>,
    ) -> VetoOutcome {
        while let Some(name) = order.pop_front() {
            let Some(plugin) = self
                .plugins
                .iter_mut()
                .find(|p| p.name() == name && p.is_enabled())
            else {
                continue;
            };
            let Some(handler) = plugin.handler_mut(hook) else {
                continue;
            };
            match handler(ctx, args) {
                Ok(HookValue::Bool(false)) => {
                    log::debug!("[waterfall] {hook} vetoed by `{name}`");
                    return VetoOutcome::Vetoed { plugin: name };
                }
                Ok(HookValue::Pending(future)) => {
                    return VetoOutcome::Pending(PendingVeto {
                        hook,
                        plugin: name,
                        future,
                        remaining: order,
                    });
                }
                Ok(_) => {}
                Err(error) => record(&mut self.failures, &name, hook.name(), error),
            }
        }
        VetoOutcome::Allowed
    }

    /// Synchronous veto used for per-item hooks. Asynchronous answers count as
    /// allowing the item.
    pub fn check(&mut self, hook: Hook, ctx: &PluginContext<T>, args: &HookArgs<'_, T>) -> bool {
        match self.dispatch_veto(hook, ctx, args) {
            VetoOutcome::Allowed => true,
            VetoOutcome::Vetoed { .. } => false,
            VetoOutcome::Pending(pending) => {
                log::warn!(
                    "[waterfall] plugin `{}` answered {} asynchronously; treating as allowed",
                    pending.plugin,
                    hook
                );
                true
            }
        }
    }

    /// Override-class dispatch: the first defined value wins.
    ///
    /// A handler that returns [`HookValue::None`] is treated exactly like a
    /// plugin without the hook, and dispatch moves on.
    pub fn dispatch_override(
        &mut self,
        hook: Hook,
        ctx: &PluginContext<T>,
        args: &HookArgs<'_, T>,
    ) -> Option<HookValue<T>> {
        for plugin in self.plugins.iter_mut().filter(|p| p.is_enabled()) {
            let name = plugin.name().to_owned();
            let Some(handler) = plugin.handler_mut(hook) else {
                continue;
            };
            match handler(ctx, args) {
                Ok(value) if value.is_defined() => return Some(value),
                Ok(_) => {}
                Err(error) => record(&mut self.failures, &name, hook.name(), error),
            }
        }
        None
    }

    /// Notification-class dispatch: everyone runs, results are ignored.
    pub fn notify(&mut self, hook: Hook, ctx: &PluginContext<T>, args: &HookArgs<'_, T>) {
        for plugin in self.plugins.iter_mut().filter(|p| p.is_enabled()) {
            let name = plugin.name().to_owned();
            let Some(handler) = plugin.handler_mut(hook) else {
                continue;
            };
            if let Err(error) = handler(ctx, args) {
                record(&mut self.failures, &name, hook.name(), error);
            }
        }
    }

    /// Render-class dispatch: every defined value, in dispatch order.
    pub fn collect(
        &mut self,
        hook: Hook,
        ctx: &PluginContext<T>,
        args: &HookArgs<'_, T>,
    ) -> Vec<Rc<dyn Any>> {
        let mut rendered = Vec::new();
        for plugin in self.plugins.iter_mut().filter(|p| p.is_enabled()) {
            let name = plugin.name().to_owned();
            let Some(handler) = plugin.handler_mut(hook) else {
                continue;
            };
            match handler(ctx, args) {
                Ok(HookValue::Rendered(value)) => rendered.push(value),
                Ok(_) => {}
                Err(error) => record(&mut self.failures, &name, hook.name(), error),
            }
        }
        rendered
    }

    /// Runs every enabled `transform_props` in dispatch order. A failing
    /// transform leaves the props it was given unchanged.
    pub fn transform_props(
        &mut self,
        mut props: WaterfallProps<T>,
        env: &TransformEnv,
    ) -> WaterfallProps<T> {
        for plugin in self.plugins.iter_mut().filter(|p| p.is_enabled()) {
            let name = plugin.name().to_owned();
            let Some(transform) = plugin.transform_mut() else {
                continue;
            };
            let input = props.clone();
            match transform(props, env) {
                Ok(next) => props = next,
                Err(error) => {
                    record(&mut self.failures, &name, Hook::TransformProps.name(), error);
                    props = input;
                }
            }
        }
        props
    }

    /// Delivers `error` to the error extension point. A failure there is
    /// logged and ends this delivery.
    pub fn report_error(&mut self, ctx: &PluginContext<T>, error: &WaterfallError) {
        let args = HookArgs::Error(error);
        for plugin in self.plugins.iter_mut().filter(|p| p.is_enabled()) {
            let name = plugin.name().to_owned();
            let Some(handler) = plugin.handler_mut(Hook::Error) else {
                continue;
            };
            if let Err(failure) = handler(ctx, &args) {
                log::warn!("[waterfall] plugin `{name}` failed while handling an error: {failure}");
                break;
            }
        }
    }

    /// Errors caught since the last call.
    pub fn take_failures(&mut self) -> Vec<PluginFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Polls pending teardowns. Returns true if any finished.
    pub fn poll_teardowns(&mut self, cx: &mut Context<'_>) -> bool {
        if self.teardowns.is_empty() {
            return false;
        }
        let mut finished = false;
        let mut pending = Vec::with_capacity(self.teardowns.len());
        for (name, mut future) in std::mem::take(&mut self.teardowns) {
            match future.as_mut().poll(cx) {
                Poll::Ready(Ok(())) => {
                    finished = true;
                    log::debug!("[waterfall] plugin `{name}` torn down");
                }
                Poll::Ready(Err(error)) => {
                    finished = true;
                    log::warn!("[waterfall] plugin `{name}` failed to tear down: {error}");
                }
                Poll::Pending => pending.push((name, future)),
            }
        }
        self.teardowns = pending;
        finished
    }

    pub fn pending_teardowns(&self) -> usize {
        self.teardowns.len()
    }
}

fn record(failures: &mut Vec<PluginFailure>, plugin: &str, stage: &'static str, error: PluginError) {
    log::warn!("[waterfall] plugin `{plugin}` failed in {stage}: {error}");
    failures.push(PluginFailure {
        plugin: plugin.to_owned(),
        stage,
        error,
    });
}

impl<T> fmt::Debug for PluginManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugins)
            .field("failures", &self.failures.len())
            .field("teardowns", &self.teardowns.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/manager_tests.rs"]
mod tests;
