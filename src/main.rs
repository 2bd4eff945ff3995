use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paysession::application::session::VerificationSession;
use paysession::config::{LogFormat, SessionConfig};
use paysession::domain::form::{FieldEdit, FormField, PaymentForm};
use paysession::domain::ports::{PaymentStoreBox, QuerySourceBox, TransportHandle};
use paysession::infrastructure::channel_transport::ChannelTransport;
use paysession::infrastructure::in_memory::InMemoryPaymentStore;
use paysession::infrastructure::query::NavigationQuery;
use paysession::interfaces::jsonl::event_reader::EventReader;
use paysession::interfaces::jsonl::outcome_writer::OutcomeWriter;
use paysession::logging::init_logging;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verification events pushed by the server, one JSON object per line
    events: PathBuf,

    /// Card details as a JSON object with camelCase keys
    #[arg(long)]
    form: PathBuf,

    /// Navigation query the payment page was opened with
    #[arg(long, default_value = "")]
    query: String,

    /// Field edits applied after the form file, e.g. `--field cardCvv=123`
    #[arg(long = "field", value_name = "KEY=VALUE")]
    fields: Vec<FieldEdit>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the pending timeout from the settings file
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Overrides the log format from the settings file
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path).into_diagnostic()?,
        None => SessionConfig::default(),
    };
    if let Some(timeout_ms) = cli.timeout_ms {
        config.pending_timeout_ms = timeout_ms;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    init_logging(config.log_format, &config.log_level);

    let form: PaymentForm =
        serde_json::from_reader(File::open(&cli.form).into_diagnostic()?).into_diagnostic()?;

    let transport = ChannelTransport::new();
    let store: PaymentStoreBox = Box::new(InMemoryPaymentStore::new());
    let handle: TransportHandle = Arc::new(transport.clone());
    let query: QuerySourceBox = Box::new(NavigationQuery::parse(&cli.query));

    let mut session = VerificationSession::new(store, handle, query, config);
    session.attach().into_diagnostic()?;

    // Enter the form field by field, as a user would
    session
        .update_field(FormField::CardNumber, form.card_number)
        .await
        .into_diagnostic()?;
    session
        .update_field(FormField::CardHolder, form.card_holder)
        .await
        .into_diagnostic()?;
    session
        .update_field(FormField::CardMonth, form.card_month)
        .await
        .into_diagnostic()?;
    session
        .update_field(FormField::CardYear, form.card_year)
        .await
        .into_diagnostic()?;
    session
        .update_field(FormField::CardCvv, form.card_cvv)
        .await
        .into_diagnostic()?;
    session
        .update_field(FormField::IsCardFlipped, form.is_card_flipped)
        .await
        .into_diagnostic()?;

    for edit in cli.fields {
        session
            .update_field(edit.field, edit.value)
            .await
            .into_diagnostic()?;
    }

    session.submit().await.into_diagnostic()?;

    // Replay the server side. Unreadable lines are logged and skipped.
    let file = File::open(&cli.events).into_diagnostic()?;
    let events = EventReader::new(file);
    for event_result in events.events() {
        match event_result {
            Ok(event) => {
                transport.emit(event).into_diagnostic()?;
            }
            Err(e) => {
                error!("Error reading event: {}", e);
            }
        }
    }

    let lifecycle = session.run_until_settled().await.into_diagnostic()?;
    match lifecycle.error_message() {
        Some(reason) => warn!(reason, "payment attempt failed"),
        None => info!(?lifecycle, "session settled"),
    }

    // Late events such as a support request after success
    session.pump().await.into_diagnostic()?;

    let outcome = session.outcome().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    writer.write_outcome(&outcome).into_diagnostic()?;

    Ok(())
}
