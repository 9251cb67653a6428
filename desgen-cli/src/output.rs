use std::io::{self, Write};

use desgen::context::DesignContext;

use crate::cli::OutputFormat;

pub const READY_BANNER: &str = "AI Design System Ready";
pub const PROMPT_QUESTION: &str = "What do you want to design?";
pub const RESULT_HEADER: &str = "Final Design Output:";

/// Writes a finished design context to a sink in the chosen format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints the startup banner; JSON output stays a single object.
    pub fn emit_banner(&self) -> io::Result<()> {
        if self.format == OutputFormat::Text {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{READY_BANNER}")?;
            stdout.flush()?;
        }
        Ok(())
    }

    pub fn emit_context(&self, context: &DesignContext) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.write_context(&mut stdout, context)?;
        stdout.flush()
    }

    pub fn write_context<W: Write>(&self, out: &mut W, context: &DesignContext) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(out, "{RESULT_HEADER}")?;
                for (key, value) in context.iter() {
                    writeln!(out)?;
                    writeln!(out, "{}:", key.to_uppercase())?;
                    writeln!(out, "{value}")?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, context)?;
                writeln!(out)
            }
        }
    }
}
