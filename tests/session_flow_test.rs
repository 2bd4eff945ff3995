mod common;

use async_trait::async_trait;
use common::{fill_valid_card, harness};
use paysession::config::SessionConfig;
use paysession::domain::event::{VerificationEvent, VerificationStep};
use paysession::domain::form::{FormField, PaymentSubmission};
use paysession::domain::lifecycle::RequestLifecycle;
use paysession::domain::ports::{PaymentStore, Subscription, Transport, TransportId};
use paysession::error::SessionError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_every_good_step_completes_the_session() {
    for step in VerificationStep::ALL {
        let mut h = harness("price=49", SessionConfig::default());
        h.session.attach().unwrap();
        fill_valid_card(&mut h.session).await;
        let submission = h.session.submit().await.unwrap();

        h.transport
            .emit(VerificationEvent::Good {
                step,
                kind: format!("{step:?}"),
            })
            .unwrap();
        let lifecycle = h.session.run_until_settled().await.unwrap();

        assert_eq!(lifecycle, RequestLifecycle::Success);
        let data = h.store.data().await.unwrap().unwrap();
        assert_eq!(data.state, submission.form);
        assert_eq!(data.kind, format!("{step:?}"));
    }
}

#[tokio::test]
async fn test_retry_after_rejection() {
    let mut h = harness("price=79", SessionConfig::default());
    h.session.attach().unwrap();
    fill_valid_card(&mut h.session).await;

    h.session.submit().await.unwrap();
    h.transport.emit(VerificationEvent::Bad).unwrap();
    assert!(h.session.run_until_settled().await.unwrap().is_error());
    assert!(h.store.lifecycle().await.unwrap().is_error());

    h.session
        .update_field(FormField::CardNumber, "4000 0000 0000 0002")
        .await
        .unwrap();
    assert_eq!(h.session.lifecycle(), &RequestLifecycle::Idle);

    let retry = h.session.submit().await.unwrap();
    assert_eq!(retry.form.card_number, "4000 0000 0000 0002");
    h.transport
        .emit(VerificationEvent::Good {
            step: VerificationStep::TwoFactor,
            kind: "app".to_string(),
        })
        .unwrap();

    assert_eq!(
        h.session.run_until_settled().await.unwrap(),
        RequestLifecycle::Success
    );
    assert_eq!(h.transport.submissions().len(), 2);
    assert!(h.transport.submissions().iter().all(|s| s.price.as_deref() == Some("79")));
}

#[tokio::test]
async fn test_support_request_does_not_settle_pending() {
    let mut h = harness("", SessionConfig::default());
    h.session.attach().unwrap();
    fill_valid_card(&mut h.session).await;
    h.session.submit().await.unwrap();

    h.transport.emit(VerificationEvent::SupportRequested).unwrap();
    assert_eq!(h.session.pump().await.unwrap(), 1);

    assert!(h.store.support_visible().await.unwrap());
    assert_eq!(h.session.lifecycle(), &RequestLifecycle::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_late_result_is_not_credited_to_the_retry() {
    let config = SessionConfig {
        pending_timeout_ms: 2_000,
        ..SessionConfig::default()
    };
    let mut h = harness("", config);
    h.session.attach().unwrap();
    fill_valid_card(&mut h.session).await;
    h.session.submit().await.unwrap();

    let lifecycle = h.session.run_until_settled().await.unwrap();
    assert!(lifecycle.is_error());

    tokio::time::advance(Duration::from_secs(1)).await;
    h.transport
        .emit(VerificationEvent::Good {
            step: VerificationStep::Code,
            kind: "sms".to_string(),
        })
        .unwrap();

    // Retry without reading the queue first
    h.session
        .update_field(FormField::CardCvv, "999")
        .await
        .unwrap();
    h.session.submit().await.unwrap();
    assert_eq!(h.session.lifecycle(), &RequestLifecycle::Pending);

    h.transport
        .emit(VerificationEvent::Good {
            step: VerificationStep::Tan,
            kind: "tan".to_string(),
        })
        .unwrap();
    assert_eq!(
        h.session.run_until_settled().await.unwrap(),
        RequestLifecycle::Success
    );
    let data = h.store.data().await.unwrap().unwrap();
    assert_eq!(data.kind, "tan");
    assert_eq!(data.state.card_cvv, "999");
}

#[tokio::test]
async fn test_rejection_before_submit_is_dropped() {
    let mut h = harness("price=49", SessionConfig::default());
    h.session.attach().unwrap();
    h.transport.emit(VerificationEvent::Bad).unwrap();

    fill_valid_card(&mut h.session).await;
    h.session.submit().await.unwrap();
    assert_eq!(h.store.lifecycle().await.unwrap(), RequestLifecycle::Pending);

    h.transport
        .emit(VerificationEvent::Good {
            step: VerificationStep::Auth,
            kind: "auth".to_string(),
        })
        .unwrap();
    assert_eq!(
        h.session.run_until_settled().await.unwrap(),
        RequestLifecycle::Success
    );
}

/// A transport whose event stream ends as soon as it is subscribed to.
struct ClosedTransport;

#[async_trait]
impl Transport for ClosedTransport {
    fn id(&self) -> TransportId {
        TransportId(u64::MAX)
    }

    fn subscribe(&self) -> paysession::error::Result<Subscription> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Ok(Subscription::new(self.id(), rx, || {}))
    }

    async fn submit(&self, _submission: PaymentSubmission) -> paysession::error::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_transport_closed_while_pending() {
    let mut h = harness("", SessionConfig::default());
    h.session.replace_transport(Arc::new(ClosedTransport)).unwrap();
    fill_valid_card(&mut h.session).await;
    h.session.submit().await.unwrap();

    let result = h.session.run_until_settled().await;
    assert!(matches!(result, Err(SessionError::TransportError(_))));
    assert!(matches!(
        h.session.submit().await,
        Err(SessionError::SubmissionPending)
    ));
    assert!(h.transport.submissions().is_empty());
}
