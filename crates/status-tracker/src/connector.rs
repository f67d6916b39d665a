use crate::error::TrackerError;
use async_trait::async_trait;
use database::{DbHandle, DisconnectHook, MongoConnector};
use std::sync::Arc;

/// An open connection the tracker holds on to until it drops or the process exits.
#[async_trait]
pub trait Session: Send + Sync {
    async fn close(&self);
}

/// Something that can open a [`Session`].
///
/// The tracker is written against this trait so it can be driven by a real
/// MongoDB deployment or by a scripted stand-in.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens and verifies a connection. `on_disconnect` must be called
    /// whenever the returned session later loses its last usable server.
    async fn connect(
        &self,
        on_disconnect: DisconnectHook,
    ) -> Result<Arc<dyn Session>, TrackerError>;
}

#[async_trait]
impl Session for DbHandle {
    async fn close(&self) {
        DbHandle::close(self.clone()).await;
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(
        &self,
        on_disconnect: DisconnectHook,
    ) -> Result<Arc<dyn Session>, TrackerError> {
        match self.open(Some(on_disconnect)).await {
            Ok(handle) => Ok(Arc::new(handle)),
            Err(e) => Err(TrackerError::Connection(e.message())),
        }
    }
}
