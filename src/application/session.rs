use crate::config::SessionConfig;
use crate::domain::event::VerificationEvent;
use crate::domain::form::{FieldValue, FormField, PaymentForm, PaymentSubmission, VerifiedPayment};
use crate::domain::lifecycle::RequestLifecycle;
use crate::domain::ports::{
    PaymentStoreBox, QuerySourceBox, Subscription, TransportHandle, TransportId,
};
use crate::error::{Result, SessionError};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What the rest of the application sees once a session settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub lifecycle: RequestLifecycle,
    pub support_visible: bool,
    pub data: Option<VerifiedPayment>,
    pub submission: Option<PaymentSubmission>,
}

/// Drives one payment attempt from card entry to a verified (or failed) result.
///
/// The session owns the form, gates submission on validation and on the
/// lifecycle, and turns server-pushed verification events into lifecycle
/// transitions that are written through to the injected store.
///
/// `Idle -> Pending` on a valid submit, `Pending -> Success` on any good event,
/// `Pending -> Error` on a bad event or timeout, `Error -> Idle` on the next
/// field edit. `Success` is terminal.
pub struct VerificationSession {
    form: PaymentForm,
    lifecycle: RequestLifecycle,
    support_visible: bool,
    pending_since: Option<Instant>,
    last_submission: Option<PaymentSubmission>,
    store: PaymentStoreBox,
    transport: TransportHandle,
    query: QuerySourceBox,
    subscription: Option<Subscription>,
    config: SessionConfig,
}

impl VerificationSession {
    /// Creates a new session in the `Idle` state with an empty form.
    ///
    /// # Arguments
    ///
    /// * `store` - Sink for lifecycle, verified data and the support flag.
    /// * `transport` - Channel used to submit and to receive verification events.
    /// * `query` - Source of the navigation query (`price`).
    /// * `config` - Timeout and message settings.
    pub fn new(
        store: PaymentStoreBox,
        transport: TransportHandle,
        query: QuerySourceBox,
        config: SessionConfig,
    ) -> Self {
        Self {
            form: PaymentForm::default(),
            lifecycle: RequestLifecycle::Idle,
            support_visible: false,
            pending_since: None,
            last_submission: None,
            store,
            transport,
            query,
            subscription: None,
            config,
        }
    }

    pub fn form(&self) -> &PaymentForm {
        &self.form
    }

    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    pub fn support_visible(&self) -> bool {
        self.support_visible
    }

    /// A verified session renders no further form.
    pub fn is_complete(&self) -> bool {
        self.lifecycle.is_success()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Registers for verification events on the current transport.
    ///
    /// Attaching again to the same transport is a no-op; a subscription held
    /// for a previous transport is disposed first.
    pub fn attach(&mut self) -> Result<TransportId> {
        let id = self.transport.id();
        if let Some(subscription) = &self.subscription
            && subscription.transport() == id
        {
            return Ok(id);
        }

        if let Some(stale) = self.subscription.take() {
            debug!(transport = %stale.transport(), "disposing stale subscription");
            stale.dispose();
        }

        self.subscription = Some(self.transport.subscribe()?);
        info!(transport = %id, "listening for verification events");
        Ok(id)
    }

    /// Disposes the current subscription, if any.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(transport = %subscription.transport(), "detaching from transport");
            subscription.dispose();
        }
    }

    /// Swaps the transport. An attached session re-attaches to the new one.
    pub fn replace_transport(&mut self, transport: TransportHandle) -> Result<()> {
        let was_attached = self.is_attached();
        self.transport = transport;
        if was_attached {
            self.attach()?;
        }
        Ok(())
    }

    /// Sets a form field, falling back to its default on an empty value.
    ///
    /// An edit after a failed attempt returns the session to `Idle`.
    pub async fn update_field(
        &mut self,
        field: FormField,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        if self.is_complete() {
            return Err(SessionError::SessionCompleted);
        }

        self.form.update_field(field, value)?;
        if self.lifecycle.is_error() {
            self.set_lifecycle(RequestLifecycle::Idle).await?;
        }
        Ok(())
    }

    pub fn validate(&self) -> bool {
        self.form.is_submittable()
    }

    pub fn can_submit(&self) -> bool {
        self.validate() && !self.lifecycle.is_pending() && !self.is_complete()
    }

    /// Sends the current form together with the `price` query parameter.
    ///
    /// The verification result arrives later through the subscription.
    pub async fn submit(&mut self) -> Result<PaymentSubmission> {
        if self.is_complete() {
            return Err(SessionError::SessionCompleted);
        }
        if self.lifecycle.is_pending() {
            return Err(SessionError::SubmissionPending);
        }
        if !self.validate() {
            return Err(SessionError::InvalidForm);
        }

        // Results queued since the last attempt belong to no submission
        self.discard_stale_events().await?;

        let submission = PaymentSubmission {
            form: self.form.clone(),
            price: self.query.query("price"),
        };
        let previous = self.lifecycle.clone();
        self.set_lifecycle(RequestLifecycle::Pending).await?;
        self.pending_since = Some(Instant::now());

        debug!(price = ?submission.price, "submitting payment data");
        if let Err(e) = self.transport.submit(submission.clone()).await {
            warn!(error = %e, "submission failed, restoring lifecycle");
            self.set_lifecycle(previous).await?;
            return Err(e);
        }

        self.last_submission = Some(submission.clone());
        Ok(submission)
    }

    /// Applies support requests still queued on the subscription and drops
    /// any verification result, since no submission is pending yet.
    async fn discard_stale_events(&mut self) -> Result<()> {
        let drained = self.pump().await?;
        if drained > 0 {
            debug!(drained, "drained queued events before submitting");
        }
        Ok(())
    }

    /// Applies a server-pushed verification outcome.
    ///
    /// Good and bad outcomes only count while a submission is pending; anything
    /// else is a duplicate or stale delivery and is dropped.
    pub async fn on_verification_event(&mut self, event: VerificationEvent) -> Result<()> {
        match event {
            VerificationEvent::SupportRequested => {
                info!("support requested");
                self.store.set_support_visible(true).await?;
                self.support_visible = true;
            }
            VerificationEvent::Good { step, kind } => {
                if !self.lifecycle.is_pending() {
                    warn!(?step, lifecycle = ?self.lifecycle, "ignoring verification result without pending submission");
                    return Ok(());
                }
                info!(?step, kind = %kind, "verification passed");
                self.store
                    .set_data(VerifiedPayment {
                        state: self.form.clone(),
                        kind,
                    })
                    .await?;
                self.set_lifecycle(RequestLifecycle::Success).await?;
            }
            VerificationEvent::Bad => {
                if !self.lifecycle.is_pending() {
                    warn!(lifecycle = ?self.lifecycle, "ignoring rejection without pending submission");
                    return Ok(());
                }
                info!("card data rejected");
                let message = self.config.bad_data_message.clone();
                self.set_lifecycle(RequestLifecycle::Error(message)).await?;
            }
        }
        Ok(())
    }

    fn pending_deadline(&self) -> Option<Instant> {
        self.pending_since
            .map(|since| since + self.config.pending_timeout())
    }

    /// Fails a submission that has been pending past the configured timeout.
    pub async fn check_timeout(&mut self) -> Result<bool> {
        if !self.lifecycle.is_pending() {
            return Ok(false);
        }
        match self.pending_deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                warn!(timeout_ms = self.config.pending_timeout_ms, "verification timed out");
                let message = self.config.timeout_message.clone();
                self.set_lifecycle(RequestLifecycle::Error(message)).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Applies every event already delivered, without waiting.
    pub async fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        loop {
            let Some(event) = self.subscription.as_mut().and_then(Subscription::try_recv) else {
                break;
            };
            self.on_verification_event(event).await?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Waits until a pending submission settles through an event or the timeout.
    ///
    /// Returns the lifecycle immediately when nothing is pending.
    pub async fn run_until_settled(&mut self) -> Result<RequestLifecycle> {
        self.attach()?;

        while self.lifecycle.is_pending() {
            let deadline = self.pending_deadline();
            let next = {
                let subscription = self.subscription.as_mut().ok_or_else(|| {
                    SessionError::TransportError("session is not attached".to_string())
                })?;
                match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, subscription.recv())
                        .await
                        .ok(),
                    None => Some(subscription.recv().await),
                }
            };

            match next {
                Some(Some(event)) => self.on_verification_event(event).await?,
                Some(None) => {
                    return Err(SessionError::TransportError(
                        "verification event stream closed".to_string(),
                    ));
                }
                None => {
                    self.check_timeout().await?;
                }
            }
        }

        Ok(self.lifecycle.clone())
    }

    /// Reads back what the store holds for this session.
    pub async fn outcome(&self) -> Result<SessionOutcome> {
        Ok(SessionOutcome {
            lifecycle: self.store.lifecycle().await?,
            support_visible: self.store.support_visible().await?,
            data: self.store.data().await?,
            submission: self.last_submission.clone(),
        })
    }

    async fn set_lifecycle(&mut self, lifecycle: RequestLifecycle) -> Result<()> {
        debug!(from = ?self.lifecycle, to = ?lifecycle, "lifecycle transition");
        self.store.set_lifecycle(lifecycle.clone()).await?;

        if !lifecycle.is_pending() {
            self.pending_since = None;
        }
        if lifecycle.is_error() {
            self.form.is_card_flipped = false;
        }
        self.lifecycle = lifecycle;
        Ok(())
    }
}
