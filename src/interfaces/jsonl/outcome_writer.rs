use crate::application::session::SessionOutcome;
use crate::error::Result;
use std::io::Write;

/// Writes session outcomes as pretty-printed JSON documents.
pub struct OutcomeWriter<W: Write> {
    writer: W,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_outcome(&mut self, outcome: &SessionOutcome) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, outcome)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
