//! Optional process-global dispatcher slot for embedders that want one
//! shared automation surface instead of threading a handle around.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::RwLock;

use crate::dispatcher::Dispatcher;

static GLOBAL_DISPATCHER: Lazy<Arc<RwLock<Option<Arc<Dispatcher>>>>> =
    Lazy::new(|| Arc::new(RwLock::new(None)));

/// Installs the process-global dispatcher, replacing any previous one.
pub async fn install_dispatcher(dispatcher: Arc<Dispatcher>) {
    let mut guard = GLOBAL_DISPATCHER.write().await;
    if guard.is_some() {
        tracing::info!("replacing global dispatcher");
    }
    *guard = Some(dispatcher);
}

/// The global dispatcher, if one has been installed.
pub async fn dispatcher() -> Option<Arc<Dispatcher>> {
    GLOBAL_DISPATCHER.read().await.clone()
}

/// Drops the global dispatcher. The browser it manages is not closed here;
/// callers that want a clean shutdown dispatch a close first.
pub async fn clear_dispatcher() {
    *GLOBAL_DISPATCHER.write().await = None;
}
