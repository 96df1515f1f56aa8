//! Report rendering on stdout.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context as _, Result};
use serde::Serialize;
use serde_json::json;
use toolset_governance::validator::ValidationReport;

use crate::cli::Format;

/// Writes every report in the selected format.
pub(crate) struct Printer<W> {
    format: Format,
    out: W,
}

impl<W: Write> Printer<W> {
    pub(crate) fn new(format: Format, out: W) -> Self {
        Self { format, out }
    }

    /// Prints `value` as text through `Display` or as pretty JSON.
    pub(crate) fn emit<T>(&mut self, value: &T) -> Result<()>
    where
        T: Display + Serialize + ?Sized,
    {
        match self.format {
            Format::Text => write!(self.out, "{value}"),
            Format::Json => writeln!(self.out, "{}", to_json(value)?),
        }
        .context("failed to write report")
    }

    /// Prints text as-is, or `value` as JSON.
    pub(crate) fn emit_with<T>(&mut self, text: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        match self.format {
            Format::Text => write!(self.out, "{text}"),
            Format::Json => writeln!(self.out, "{}", to_json(value)?),
        }
        .context("failed to write report")
    }

    /// Reports a failed command. Text goes to stderr except for a validation
    /// report, which stays on stdout like any other report.
    pub(crate) fn failure(
        &mut self,
        error: &anyhow::Error,
        rejected: bool,
        report: Option<&ValidationReport>,
    ) -> Result<()> {
        match self.format {
            Format::Text => {
                if let Some(report) = report {
                    write!(self.out, "{report}").context("failed to write report")?;
                }
                eprintln!("error: {error:#}");
                Ok(())
            }
            Format::Json => {
                let value = json!({
                    "error": format!("{error:#}"),
                    "rejected": rejected,
                    "report": report,
                });
                writeln!(self.out, "{}", to_json(&value)?).context("failed to write report")
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode report as JSON")
}
