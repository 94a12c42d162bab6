use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Waker;

/// Wake flag shared with the futures the composition polls.
///
/// Veto and teardown futures wake it when they can make progress; the host
/// checks [`PumpSignal::take`] to decide whether another pump is worthwhile.
#[derive(Debug, Default)]
pub(crate) struct PumpSignal {
    woken: AtomicBool,
}

impl PumpSignal {
    pub(crate) fn waker(self: &Arc<Self>) -> Waker {
        futures_task::waker(Arc::clone(self))
    }

    pub(crate) fn take(&self) -> bool {
        self.woken.swap(false, Ordering::AcqRel)
    }
}

impl futures_task::ArcWake for PumpSignal {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::Release);
    }
}
