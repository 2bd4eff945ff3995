use crate::domain::event::VerificationEvent;
use crate::domain::form::PaymentSubmission;
use crate::domain::ports::{Subscription, Transport, TransportId};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

type ListenerMap = HashMap<u64, mpsc::UnboundedSender<VerificationEvent>>;

/// In-process transport.
///
/// The backend side pushes events with [`ChannelTransport::emit`]; every live
/// subscription receives them. Outbound submissions are recorded.
#[derive(Clone)]
pub struct ChannelTransport {
    id: TransportId,
    listeners: Arc<Mutex<ListenerMap>>,
    next_listener: Arc<AtomicU64>,
    submissions: Arc<Mutex<Vec<PaymentSubmission>>>,
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self {
            id: TransportId(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed)),
            listeners: Arc::default(),
            next_listener: Arc::default(),
            submissions: Arc::default(),
        }
    }

    /// Pushes an event to all live listeners and returns how many received it.
    pub fn emit(&self, event: VerificationEvent) -> Result<usize> {
        debug!(
            transport = %self.id,
            event = event.event_name(),
            payload = ?event.payload(),
            "emitting verification event"
        );
        let mut listeners = self.lock_listeners()?;
        listeners.retain(|_, sender| sender.send(event.clone()).is_ok());
        Ok(listeners.len())
    }

    /// Number of registered listeners. Still accurate after a poisoned lock.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn submissions(&self) -> Vec<PaymentSubmission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_listeners(&self) -> Result<MutexGuard<'_, ListenerMap>> {
        self.listeners
            .lock()
            .map_err(|_| SessionError::TransportError("listener registry poisoned".to_string()))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn id(&self) -> TransportId {
        self.id
    }

    fn subscribe(&self) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.lock_listeners()?.insert(key, tx);

        let listeners = Arc::clone(&self.listeners);
        let id = self.id;
        Ok(Subscription::new(id, rx, move || {
            let mut listeners = listeners.lock().unwrap_or_else(|poisoned| {
                warn!(transport = %id, "listener registry poisoned, removing listener anyway");
                poisoned.into_inner()
            });
            listeners.remove(&key);
        }))
    }

    async fn submit(&self, submission: PaymentSubmission) -> Result<()> {
        self.submissions
            .lock()
            .map_err(|_| SessionError::TransportError("submission log poisoned".to_string()))?
            .push(submission);
        Ok(())
    }
}
