//! Last-resort handling for panics.
//!
//! A panic inside a request handler is caught by the dispatcher and answered
//! with a 500. Any other panic means an invariant is broken: it is logged and
//! the process exits with status 1.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic::{AssertUnwindSafe, PanicHookInfo};
use std::sync::Arc;

use futures_util::FutureExt;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

tokio::task_local! {
    /// Set while a request handler runs; holds the report of a caught panic.
    static DISPATCH_SCOPE: RefCell<Option<String>>;
}

/// Run `fut` inside a dispatch scope, turning a panic into
/// `Err((payload, report))`, where `report` is the panic location and
/// backtrace recorded by the hook (when installed).
pub async fn catch_dispatch_panic<F>(fut: F) -> Result<F::Output, (Box<dyn Any + Send>, Option<String>)>
where
    F: Future,
{
    DISPATCH_SCOPE
        .scope(RefCell::new(None), async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(output) => Ok(output),
                Err(payload) => {
                    let report = DISPATCH_SCOPE.with(|slot| slot.borrow_mut().take());
                    Err((payload, report))
                }
            }
        })
        .await
}

/// Restores the previous panic hook when dropped.
#[must_use = "dropping the guard uninstalls the handler"]
pub struct FatalHandlerGuard {
    previous: Arc<PanicHook>,
}

/// Install the process-wide panic hook.
pub fn install() -> FatalHandlerGuard {
    let previous: Arc<PanicHook> = Arc::new(std::panic::take_hook());
    let chained = Arc::clone(&previous);

    std::panic::set_hook(Box::new(move |info| {
        let recorded = DISPATCH_SCOPE.try_with(|slot| {
            *slot.borrow_mut() = Some(format!("{info}\n{}", Backtrace::capture()));
        });
        if recorded.is_ok() {
            return;
        }

        tracing::error!(
            panic = %info,
            backtrace = %Backtrace::force_capture(),
            "Unrecoverable error, exiting"
        );
        chained(info);
        std::process::exit(1);
    }));

    FatalHandlerGuard { previous }
}

impl Drop for FatalHandlerGuard {
    fn drop(&mut self) {
        let _ = std::panic::take_hook();
        let previous = Arc::clone(&self.previous);
        std::panic::set_hook(Box::new(move |info| previous(info)));
    }
}

impl std::fmt::Debug for FatalHandlerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FatalHandlerGuard").finish_non_exhaustive()
    }
}
