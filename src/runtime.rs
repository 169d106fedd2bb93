//! Runtime abstraction layer for async operations
//!
//! Feed and tile downloads are spawned through an [`AsyncSpawner`]. The
//! default one uses the current tokio runtime when there is one; otherwise
//! (an egui frame on a plain thread, a synchronous test) a shared background
//! runtime is started lazily.

use crate::prelude::{Arc, Future, Pin};
use crate::{MapError, Result};
use once_cell::sync::Lazy;

/// A trait for spawning async tasks (object-safe)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Fails when the task could not be started at all
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Result<Box<dyn AsyncHandle>>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    fn is_finished(&self) -> bool;
}

/// Spawns a future on the default spawner
pub fn spawn<F>(future: F) -> Result<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

pub mod spawners {
    use super::*;
    use ::tokio::runtime::{Builder, Handle, Runtime};
    use ::tokio::task::JoinHandle;

    static FALLBACK: Lazy<Option<Runtime>> = Lazy::new(|| {
        match Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("quakemap-io")
            .enable_all()
            .build()
        {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                log::error!("failed to start background runtime: {}", e);
                None
            }
        }
    });

    /// Tokio-based async spawner
    pub struct TokioSpawner;

    impl TokioSpawner {
        fn handle() -> Option<Handle> {
            Handle::try_current()
                .ok()
                .or_else(|| FALLBACK.as_ref().map(|rt| rt.handle().clone()))
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(
            &self,
            future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
        ) -> Result<Box<dyn AsyncHandle>> {
            let handle = Self::handle()
                .ok_or_else(|| MapError::Runtime("no async runtime available".into()))?;
            Ok(Box::new(TokioHandle(handle.spawn(future))))
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }
    }
}

static RUNTIME: Lazy<Arc<dyn AsyncSpawner>> = Lazy::new(|| Arc::new(spawners::TokioSpawner));

/// The default spawner
pub fn runtime() -> Arc<dyn AsyncSpawner> {
    RUNTIME.clone()
}
