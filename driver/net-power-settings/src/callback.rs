//! Invoking the driver's preview callbacks

use core::cell::Cell;

use crate::NdisStatus;

/// Whether a preview callback is currently looking at a candidate entry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessWindow {
    #[default]
    Closed,
    Open,
}

/// Keeps the access window open for as long as it's alive
struct AccessWindowGuard<'a> {
    window: &'a Cell<AccessWindow>,
}

impl<'a> AccessWindowGuard<'a> {
    fn open(window: &'a Cell<AccessWindow>) -> Self {
        let previous = window.replace(AccessWindow::Open);
        debug_assert_eq!(
            previous,
            AccessWindow::Closed,
            "preview callbacks must not be nested"
        );

        Self { window }
    }
}

impl Drop for AccessWindowGuard<'_> {
    fn drop(&mut self) {
        self.window.set(AccessWindow::Closed);
    }
}

/// What to do with a candidate entry after the driver has previewed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Accept,
    Reject,
}

impl Verdict {
    /// Only the dedicated list full status rejects an entry; every other
    /// status (including other failures) accepts it.
    pub(crate) fn from_status(status: NdisStatus, list_full: NdisStatus) -> Self {
        if status == list_full {
            Verdict::Reject
        } else {
            Verdict::Accept
        }
    }
}

/// Calls `invoke` with the access window open, closing it again however the
/// callback returns.
pub(crate) fn run_preview(
    window: &Cell<AccessWindow>,
    list_full: NdisStatus,
    invoke: impl FnOnce() -> NdisStatus,
) -> Verdict {
    let status = {
        let _window = AccessWindowGuard::open(window);
        invoke()
    };

    Verdict::from_status(status, list_full)
}

#[cfg(test)]
mod test {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    #[test]
    fn window_is_open_only_during_callback() {
        let window = Cell::new(AccessWindow::Closed);

        let verdict = run_preview(&window, NdisStatus::PM_WOL_PATTERN_LIST_FULL, || {
            assert_eq!(window.get(), AccessWindow::Open);
            NdisStatus::SUCCESS
        });

        assert_eq!(verdict, Verdict::Accept);
        assert_eq!(window.get(), AccessWindow::Closed);
    }

    #[test]
    fn only_list_full_rejects() {
        let list_full = NdisStatus::PM_PROTOCOL_OFFLOAD_LIST_FULL;

        assert_eq!(Verdict::from_status(list_full, list_full), Verdict::Reject);
        assert_eq!(
            Verdict::from_status(NdisStatus::UNSUCCESSFUL, list_full),
            Verdict::Accept
        );
        assert_eq!(
            Verdict::from_status(NdisStatus::PM_WOL_PATTERN_LIST_FULL, list_full),
            Verdict::Accept
        );
    }

    #[test]
    fn window_closes_when_callback_panics() {
        let window = Cell::new(AccessWindow::Closed);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_preview(&window, NdisStatus::PM_WOL_PATTERN_LIST_FULL, || {
                panic!("callback failed")
            })
        }));

        assert!(result.is_err());
        assert_eq!(window.get(), AccessWindow::Closed);
    }
}
