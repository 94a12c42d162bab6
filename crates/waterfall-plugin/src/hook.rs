//! Extension points and their dispatch classes.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use waterfall_core::{ItemPosition, ItemVisibility, Size, WaterfallError};

use crate::props::WaterfallProps;

/// Deferred veto decision. Resolves to false to cancel.
pub type VetoFuture = Pin<Box<dyn Future<Output = bool> + 'static>>;

/// How the manager combines the handlers of one extension point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookClass {
    /// Descending priority; a `false` stops dispatch and cancels the operation.
    Veto,
    /// First defined, non-boolean value wins; later plugins are not invoked.
    Override,
    /// Everyone runs; return values are ignored.
    Notification,
    /// Everyone runs; every defined value is collected.
    Render,
    /// Each plugin rewrites the props in turn.
    Transform,
}

macro_rules! hooks {
    ($($variant:ident => $name:literal, $class:ident;)*) => {
        /// Named extension point.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Hook {
            $($variant,)*
        }

        impl Hook {
            pub const ALL: &'static [Hook] = &[$(Hook::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Hook::$variant => $name,)*
                }
            }

            pub fn class(self) -> HookClass {
                match self {
                    $(Hook::$variant => HookClass::$class,)*
                }
            }
        }
    };
}

hooks! {
    Mount => "mount", Notification;
    Unmount => "unmount", Notification;
    PropsChange => "props_change", Notification;

    BeforeLayout => "before_layout", Veto;
    Layout => "layout", Notification;
    LayoutComplete => "layout_complete", Notification;
    CalculateColumns => "calculate_columns", Override;
    CalculateColumnWidth => "calculate_column_width", Override;
    CalculateItemPosition => "calculate_item_position", Override;

    ItemMount => "item_mount", Notification;
    ItemUnmount => "item_unmount", Notification;
    ItemEnterViewport => "item_enter_viewport", Notification;
    ItemLeaveViewport => "item_leave_viewport", Notification;
    ItemVisibilityChange => "item_visibility_change", Notification;
    ItemClick => "item_click", Notification;

    ScrollStart => "scroll_start", Notification;
    Scroll => "scroll", Notification;
    ScrollEnd => "scroll_end", Notification;
    ReachBottom => "reach_bottom", Notification;
    ReachTop => "reach_top", Notification;

    Resize => "resize", Notification;
    ItemResize => "item_resize", Notification;

    BeforeItemsChange => "before_items_change", Veto;
    ItemsChange => "items_change", Notification;
    LoadMore => "load_more", Override;
    Refresh => "refresh", Override;

    DragStart => "drag_start", Notification;
    Drag => "drag", Notification;
    DragEnd => "drag_end", Notification;
    Drop => "drop", Notification;
    ItemSelect => "item_select", Notification;
    SelectionChange => "selection_change", Notification;

    FilterItem => "filter_item", Veto;
    SearchItem => "search_item", Veto;
    SortItems => "sort_items", Override;

    PerformanceMetric => "performance_metric", Notification;
    CalculateVisibleRange => "calculate_visible_range", Override;

    Error => "error", Notification;
    ItemLoadError => "item_load_error", Notification;

    RenderContainer => "render_container", Render;
    RenderItemWrapper => "render_item_wrapper", Render;
    RenderOverlay => "render_overlay", Render;
    RenderLoadingMore => "render_loading_more", Render;
    RenderEmpty => "render_empty", Render;
    RenderError => "render_error", Render;

    TransformProps => "transform_props", Transform;
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters handed to the performance extension point after each commit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub layout_count: u64,
    pub last_layout_duration: Duration,
    pub item_count: usize,
    pub rendered_item_count: usize,
    pub visible_item_count: usize,
}

/// Arguments for one dispatch. Which variant accompanies which hook is fixed
/// by the caller; handlers match on the variant they expect.
pub enum HookArgs<'a, T> {
    None,
    PropsChange {
        prev: &'a WaterfallProps<T>,
        next: &'a WaterfallProps<T>,
    },
    ColumnWidth {
        container_width: f32,
        columns: usize,
    },
    ItemPosition {
        index: usize,
        height: f32,
        column_width: f32,
        column_heights: &'a [f32],
    },
    Item {
        index: usize,
    },
    Visibility(ItemVisibility),
    ItemClick {
        index: usize,
        item: &'a T,
    },
    Scroll {
        top: f32,
        left: f32,
    },
    ReachBottom {
        distance: f32,
    },
    Resize(Size),
    ItemResize {
        index: usize,
        size: Size,
    },
    ItemsChange {
        old: &'a [T],
        new: &'a [T],
    },
    LoadMore {
        page: usize,
    },
    Drop {
        from: usize,
        to: usize,
    },
    ItemSelect {
        index: usize,
        selected: bool,
    },
    SelectionChange {
        selected: &'a [usize],
    },
    FilterItem {
        index: usize,
        item: &'a T,
    },
    SearchItem {
        index: usize,
        item: &'a T,
        query: &'a str,
    },
    SortItems {
        items: &'a [T],
    },
    Performance(&'a PerformanceMetrics),
    Error(&'a WaterfallError),
    ItemLoadError {
        index: usize,
        message: &'a str,
    },
}

impl<T> HookArgs<'_, T> {
    /// Item index carried by per-item arguments.
    pub fn index(&self) -> Option<usize> {
        match self {
            HookArgs::ItemPosition { index, .. }
            | HookArgs::Item { index }
            | HookArgs::ItemClick { index, .. }
            | HookArgs::ItemResize { index, .. }
            | HookArgs::ItemSelect { index, .. }
            | HookArgs::FilterItem { index, .. }
            | HookArgs::SearchItem { index, .. }
            | HookArgs::ItemLoadError { index, .. } => Some(*index),
            HookArgs::Visibility(visibility) => Some(visibility.index),
            _ => None,
        }
    }
}

/// What a handler produced.
pub enum HookValue<T> {
    /// Nothing. Treated exactly like a plugin that does not implement the hook.
    None,
    Bool(bool),
    /// Veto decision that is not known yet.
    Pending(VetoFuture),
    Columns(usize),
    ColumnWidth(f32),
    Position(ItemPosition),
    VisibleRange(Range<usize>),
    /// Permutation of the current item indices.
    Order(Vec<usize>),
    Items(Vec<T>),
    Rendered(Rc<dyn Any>),
}

impl<T> HookValue<T> {
    /// True for values that count as a result in override dispatch.
    pub fn is_defined(&self) -> bool {
        !matches!(
            self,
            HookValue::None | HookValue::Bool(_) | HookValue::Pending(_)
        )
    }
}

impl<T> fmt::Debug for HookValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookValue::None => f.write_str("None"),
            HookValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            HookValue::Pending(_) => f.write_str("Pending"),
            HookValue::Columns(value) => f.debug_tuple("Columns").field(value).finish(),
            HookValue::ColumnWidth(value) => f.debug_tuple("ColumnWidth").field(value).finish(),
            HookValue::Position(value) => f.debug_tuple("Position").field(value).finish(),
            HookValue::VisibleRange(value) => f.debug_tuple("VisibleRange").field(value).finish(),
            HookValue::Order(value) => f.debug_tuple("Order").field(&value.len()).finish(),
            HookValue::Items(value) => f.debug_tuple("Items").field(&value.len()).finish(),
            HookValue::Rendered(_) => f.write_str("Rendered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(Hook::BeforeLayout.class(), HookClass::Veto);
        assert_eq!(Hook::BeforeItemsChange.class(), HookClass::Veto);
        assert_eq!(Hook::CalculateColumns.class(), HookClass::Override);
        assert_eq!(Hook::RenderOverlay.class(), HookClass::Render);
        assert_eq!(Hook::TransformProps.class(), HookClass::Transform);
        assert_eq!(Hook::Scroll.class(), HookClass::Notification);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Hook::ALL.iter().map(|hook| hook.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_defined_values() {
        assert!(!HookValue::<()>::None.is_defined());
        assert!(!HookValue::<()>::Bool(false).is_defined());
        assert!(HookValue::<()>::Columns(2).is_defined());
    }
}
