#![allow(dead_code)]

use paysession::application::session::VerificationSession;
use paysession::config::SessionConfig;
use paysession::domain::form::FormField;
use paysession::infrastructure::channel_transport::ChannelTransport;
use paysession::infrastructure::in_memory::InMemoryPaymentStore;
use paysession::infrastructure::query::NavigationQuery;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub struct Harness {
    pub session: VerificationSession,
    pub store: InMemoryPaymentStore,
    pub transport: ChannelTransport,
}

pub fn harness(query: &str, config: SessionConfig) -> Harness {
    let store = InMemoryPaymentStore::new();
    let transport = ChannelTransport::new();
    let session = VerificationSession::new(
        Box::new(store.clone()),
        Arc::new(transport.clone()),
        Box::new(NavigationQuery::parse(query)),
        config,
    );
    Harness {
        session,
        store,
        transport,
    }
}

pub async fn fill_valid_card(session: &mut VerificationSession) {
    let fields = [
        (FormField::CardNumber, "5555 4444 3333 1111"),
        (FormField::CardHolder, "ERIKA MUSTERMANN"),
        (FormField::CardMonth, "12"),
        (FormField::CardYear, "2030"),
        (FormField::CardCvv, "321"),
    ];
    for (field, value) in fields {
        session.update_field(field, value).await.unwrap();
    }
}

pub fn write_lines(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}
