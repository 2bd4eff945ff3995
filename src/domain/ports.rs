use super::event::VerificationEvent;
use super::form::{PaymentSubmission, VerifiedPayment};
use super::lifecycle::RequestLifecycle;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sink for everything the rest of the application reads about a payment attempt.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn set_lifecycle(&self, lifecycle: RequestLifecycle) -> Result<()>;
    async fn lifecycle(&self) -> Result<RequestLifecycle>;
    async fn set_data(&self, data: VerifiedPayment) -> Result<()>;
    async fn data(&self) -> Result<Option<VerifiedPayment>>;
    async fn set_support_visible(&self, visible: bool) -> Result<()>;
    async fn support_visible(&self) -> Result<bool>;
}

/// Identity of a transport instance. Listeners are registered once per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(pub u64);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport-{}", self.0)
    }
}

/// Bidirectional channel to the verification backend.
#[async_trait]
pub trait Transport: Send + Sync {
    fn id(&self) -> TransportId;

    /// Registers a listener for inbound verification events.
    fn subscribe(&self) -> Result<Subscription>;

    /// Sends a submission. The outcome arrives later as an event.
    async fn submit(&self, submission: PaymentSubmission) -> Result<()>;
}

/// Read access to the current navigation query parameters.
pub trait QuerySource: Send + Sync {
    fn query(&self, key: &str) -> Option<String>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type TransportHandle = Arc<dyn Transport>;
pub type QuerySourceBox = Box<dyn QuerySource>;

type Disposer = Box<dyn FnOnce() + Send>;

/// A registered listener. Dropping or disposing it deregisters the listener.
pub struct Subscription {
    transport: TransportId,
    events: mpsc::UnboundedReceiver<VerificationEvent>,
    disposer: Option<Disposer>,
}

impl Subscription {
    pub fn new(
        transport: TransportId,
        events: mpsc::UnboundedReceiver<VerificationEvent>,
        disposer: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            transport,
            events,
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn transport(&self) -> TransportId {
        self.transport
    }

    /// Waits for the next event. Returns `None` once the transport has gone away.
    pub async fn recv(&mut self) -> Option<VerificationEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<VerificationEvent> {
        self.events.try_recv().ok()
    }

    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
