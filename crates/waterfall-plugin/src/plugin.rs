//! Plugin definition.
//!
//! A plugin is a name, a priority and a dispatch table keyed by [`Hook`].
//! Handlers are installed through class-specific helpers (`veto`, `notify`,
//! `calculate_columns`, ...) or through the raw [`Plugin::on`].

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use waterfall_core::ItemPosition;

use crate::context::PluginContext;
use crate::error::PluginError;
use crate::hook::{Hook, HookArgs, HookClass, HookValue, VetoFuture};
use crate::props::{TransformEnv, WaterfallProps};

pub type HookResult<T> = Result<HookValue<T>, PluginError>;

pub type HookHandler<T> = Box<dyn FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> HookResult<T>>;

pub type TransformFn<T> =
    Box<dyn FnMut(WaterfallProps<T>, &TransformEnv) -> Result<WaterfallProps<T>, PluginError>>;

pub type InitFn<T> = Box<dyn FnOnce(&PluginContext<T>) -> Result<(), PluginError>>;

pub type TeardownFuture = Pin<Box<dyn Future<Output = Result<(), PluginError>> + 'static>>;

pub type DestroyFn = Box<dyn FnOnce() -> TeardownFuture>;

pub struct Plugin<T> {
    name: String,
    version: Option<String>,
    description: Option<String>,
    priority: i32,
    enabled: bool,
    dependencies: Vec<String>,
    hooks: FxHashMap<Hook, HookHandler<T>>,
    transform: Option<TransformFn<T>>,
    config: Option<Rc<dyn Any>>,
    init: Option<InitFn<T>>,
    destroy: Option<DestroyFn>,
}

impl<T: 'static> Plugin<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            priority: 0,
            enabled: true,
            dependencies: Vec::new(),
            hooks: FxHashMap::default(),
            transform: None,
            config: None,
            init: None,
            destroy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Opaque configuration attached by the plugin author.
    pub fn config<C: Any>(&self) -> Option<&C> {
        self.config.as_ref().and_then(|config| config.downcast_ref())
    }

    pub fn has_hook(&self, hook: Hook) -> bool {
        match hook {
            Hook::TransformProps => self.transform.is_some(),
            _ => self.hooks.contains_key(&hook),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn with_config<C: Any>(mut self, config: C) -> Self {
        self.config = Some(Rc::new(config));
        self
    }

    /// Runs once at registration; a failure is logged and the plugin stays registered.
    pub fn on_init<F>(mut self, init: F) -> Self
    where
        F: FnOnce(&PluginContext<T>) -> Result<(), PluginError> + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }

    /// Asynchronous teardown run when the plugin is unregistered.
    pub fn on_destroy<F, Fut>(mut self, destroy: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<(), PluginError>> + 'static,
    {
        self.destroy = Some(Box::new(move || Box::pin(destroy()) as TeardownFuture));
        self
    }

    /// Installs a raw handler for `hook`, replacing any previous one.
    pub fn on<F>(mut self, hook: Hook, handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> HookResult<T> + 'static,
    {
        if hook == Hook::TransformProps {
            log::warn!(
                "[waterfall] plugin `{}`: install transform_props with `transform_props`",
                self.name
            );
            return self;
        }
        self.hooks.insert(hook, Box::new(handler));
        self
    }

    /// Installs a veto-class handler. Returning false cancels the operation.
    pub fn veto<F>(self, hook: Hook, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> Result<bool, PluginError> + 'static,
    {
        self.expect_class(hook, HookClass::Veto);
        self.on(hook, move |ctx, args| handler(ctx, args).map(HookValue::Bool))
    }

    /// Installs a veto-class handler whose decision arrives later.
    pub fn veto_async<F, Fut>(self, hook: Hook, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> Fut + 'static,
        Fut: Future<Output = bool> + 'static,
    {
        self.expect_class(hook, HookClass::Veto);
        self.on(hook, move |ctx, args| {
            let future: VetoFuture = Box::pin(handler(ctx, args));
            Ok(HookValue::Pending(future))
        })
    }

    /// Installs a notification-class handler.
    pub fn notify<F>(self, hook: Hook, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> Result<(), PluginError> + 'static,
    {
        self.expect_class(hook, HookClass::Notification);
        self.on(hook, move |ctx, args| handler(ctx, args).map(|()| HookValue::None))
    }

    /// Installs a render-class handler. `None` contributes nothing.
    pub fn render<F>(self, hook: Hook, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> Option<Rc<dyn Any>> + 'static,
    {
        self.expect_class(hook, HookClass::Render);
        self.on(hook, move |ctx, args| {
            Ok(handler(ctx, args).map_or(HookValue::None, HookValue::Rendered))
        })
    }

    pub fn calculate_columns<F>(self, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>) -> Option<usize> + 'static,
    {
        self.on(Hook::CalculateColumns, move |ctx, _| {
            Ok(handler(ctx).map_or(HookValue::None, HookValue::Columns))
        })
    }

    pub fn calculate_column_width<F>(self, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, f32, usize) -> Option<f32> + 'static,
    {
        self.on(Hook::CalculateColumnWidth, move |ctx, args| {
            let HookArgs::ColumnWidth {
                container_width,
                columns,
            } = args
            else {
                return Err(PluginError::UnexpectedValue);
            };
            Ok(handler(ctx, *container_width, *columns).map_or(HookValue::None, HookValue::ColumnWidth))
        })
    }

    pub fn calculate_item_position<F>(self, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>, &HookArgs<'_, T>) -> Option<ItemPosition> + 'static,
    {
        self.on(Hook::CalculateItemPosition, move |ctx, args| {
            Ok(handler(ctx, args).map_or(HookValue::None, HookValue::Position))
        })
    }

    pub fn calculate_visible_range<F>(self, mut handler: F) -> Self
    where
        F: FnMut(&PluginContext<T>) -> Option<Range<usize>> + 'static,
    {
        self.on(Hook::CalculateVisibleRange, move |ctx, _| {
            Ok(handler(ctx).map_or(HookValue::None, HookValue::VisibleRange))
        })
    }

    /// Rewrites the props before anything else reads them.
    pub fn transform_props<F>(mut self, transform: F) -> Self
    where
        F: FnMut(WaterfallProps<T>, &TransformEnv) -> Result<WaterfallProps<T>, PluginError>
            + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn handler_mut(&mut self, hook: Hook) -> Option<&mut HookHandler<T>> {
        self.hooks.get_mut(&hook)
    }

    pub(crate) fn transform_mut(&mut self) -> Option<&mut TransformFn<T>> {
        self.transform.as_mut()
    }

    pub(crate) fn take_init(&mut self) -> Option<InitFn<T>> {
        self.init.take()
    }

    pub(crate) fn take_destroy(&mut self) -> Option<DestroyFn> {
        self.destroy.take()
    }

    fn expect_class(&self, hook: Hook, class: HookClass) {
        if hook.class() != class {
            log::warn!(
                "[waterfall] plugin `{}` installs a {:?} handler on {} which dispatches as {:?}",
                self.name,
                class,
                hook,
                hook.class()
            );
        }
    }
}

impl<T> fmt::Debug for Plugin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooks: Vec<&'static str> = self.hooks.keys().map(|hook| hook.name()).collect();
        hooks.sort_unstable();
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("dependencies", &self.dependencies)
            .field("hooks", &hooks)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
