use crate::domain::form::VerifiedPayment;
use crate::domain::lifecycle::RequestLifecycle;
use crate::domain::ports::PaymentStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct PaymentState {
    lifecycle: RequestLifecycle,
    data: Option<VerifiedPayment>,
    support_visible: bool,
}

/// A thread-safe in-memory payment store.
///
/// Clones share the same state, so a caller can keep a handle while the
/// session owns another.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<PaymentState>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, idle store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn set_lifecycle(&self, lifecycle: RequestLifecycle) -> Result<()> {
        self.state.write().await.lifecycle = lifecycle;
        Ok(())
    }

    async fn lifecycle(&self) -> Result<RequestLifecycle> {
        Ok(self.state.read().await.lifecycle.clone())
    }

    async fn set_data(&self, data: VerifiedPayment) -> Result<()> {
        self.state.write().await.data = Some(data);
        Ok(())
    }

    async fn data(&self) -> Result<Option<VerifiedPayment>> {
        Ok(self.state.read().await.data.clone())
    }

    async fn set_support_visible(&self, visible: bool) -> Result<()> {
        self.state.write().await.support_visible = visible;
        Ok(())
    }

    async fn support_visible(&self) -> Result<bool> {
        Ok(self.state.read().await.support_visible)
    }
}
