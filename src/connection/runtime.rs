//! Execution contexts for exchange tasks.

use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};

/// Worker threads of the fallback runtime.
const BACKGROUND_WORKERS: usize = 2;

/// Returns the process-wide fallback runtime, building it on first use.
///
/// Returns `None` if the runtime could not be built; the failure is logged
/// once and not retried.
pub(super) fn background() -> Option<Handle> {
    static BACKGROUND: OnceLock<Option<Runtime>> = OnceLock::new();

    BACKGROUND
        .get_or_init(|| {
            Builder::new_multi_thread()
                .worker_threads(BACKGROUND_WORKERS)
                .thread_name("http-connection")
                .enable_all()
                .build()
                .map_err(|e| tracing::error!("Failed to create background runtime: {e}"))
                .ok()
        })
        .as_ref()
        .map(|runtime| runtime.handle().clone())
}

/// Picks the context for an asynchronous start: explicit, ambient, then fallback.
pub(super) fn for_async(explicit: Option<&Handle>) -> Option<Handle> {
    explicit
        .cloned()
        .or_else(|| Handle::try_current().ok())
        .or_else(background)
}

/// Picks the context for a blocking start.
///
/// The ambient runtime is skipped: the caller is about to block one of its
/// threads, which would starve a current-thread runtime.
pub(super) fn for_blocking(explicit: Option<&Handle>) -> Option<Handle> {
    explicit.cloned().or_else(background)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn worker_name() -> Option<String> {
        std::thread::current().name().map(str::to_owned)
    }

    #[test]
    fn background_runtime_runs_on_named_workers() {
        let handle = background().unwrap();

        let name = handle.block_on(handle.spawn(worker_name())).unwrap();

        assert_eq!(name.as_deref(), Some("http-connection"));
    }

    #[test]
    fn async_prefers_explicit_handle() {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("explicit-runtime")
            .build()
            .unwrap();

        let chosen = for_async(Some(runtime.handle())).unwrap();
        let name = runtime.block_on(chosen.spawn(worker_name())).unwrap();

        assert_eq!(name.as_deref(), Some("explicit-runtime"));
    }

    #[tokio::test]
    async fn async_uses_ambient_runtime() {
        let chosen = for_async(None).unwrap();

        let name = chosen.spawn(worker_name()).await.unwrap();

        assert_ne!(name.as_deref(), Some("http-connection"));
    }

    #[tokio::test]
    async fn blocking_skips_ambient_runtime() {
        let chosen = for_blocking(None).unwrap();

        let name = chosen.spawn(worker_name()).await.unwrap();

        assert_eq!(name.as_deref(), Some("http-connection"));
    }
}
