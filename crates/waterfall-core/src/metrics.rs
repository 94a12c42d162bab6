//! Box-metrics collaborator interface.
//!
//! The host environment measures boxes; the pipeline only asks for sizes and
//! for change subscriptions. Size-change notifications for subscribed items are
//! delivered back through the composition's `notify_item_resize`.

use crate::geometry::Size;

pub trait BoxMetrics {
    /// Current size of the scroll container, if it has been laid out.
    fn container_size(&self) -> Option<Size>;

    /// Current rendered size of the item at `index`, if it is mounted.
    fn item_size(&self, index: usize) -> Option<Size>;

    /// Starts delivering size-change notifications for `index`.
    ///
    /// Returns false when the item is not mounted and cannot be observed.
    fn observe_item(&self, index: usize) -> bool;

    /// Stops delivering notifications for `index`. Unknown indices are ignored.
    fn unobserve_item(&self, index: usize);
}
