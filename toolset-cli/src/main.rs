//! `toolsets`: validate, deprecate, and document the toolsets an agent
//! runtime exposes.
//!
//! Exit codes: `0` clean, `1` violations, changes, or a refused request,
//! `2` missing or corrupt inputs and other internal failures.

#![warn(missing_docs, clippy::pedantic)]

mod cli;
mod output;

use std::fmt::Write as _;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Parser;
use toolset_governance::aliases::{AliasRequest, Resolution};
use toolset_governance::config::GovernanceConfig;
use toolset_governance::migration::render_catalog;
use toolset_governance::{Governance, GovernanceError};
use tracing::{debug, warn};

use crate::cli::{Cli, Command};
use crate::output::Printer;

/// How a completed command ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Clean,
    Findings,
}

impl Outcome {
    fn clean_if(clean: bool) -> Self {
        if clean { Self::Clean } else { Self::Findings }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Clean => Self::SUCCESS,
            Outcome::Findings => Self::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = toolset_telemetry::init_tracing(cli.verbose) {
        eprintln!("warning: {err:#}");
    }

    let stdout = io::stdout();
    let mut printer = Printer::new(cli.format, stdout.lock());
    match run(&cli, &mut printer) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            let governance = err.downcast_ref::<GovernanceError>();
            let rejected = governance.is_some_and(GovernanceError::is_rejection);
            if let Err(print_err) =
                printer.failure(&err, rejected, governance.and_then(GovernanceError::report))
            {
                eprintln!("error: {print_err:#}");
            }
            if rejected {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn run<W: Write>(cli: &Cli, printer: &mut Printer<W>) -> Result<Outcome> {
    let mut config =
        GovernanceConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_overrides(cli.overrides());
    let governance = Governance::new(config)?;
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    debug!(command = ?cli.command, %today, "running command");

    match &cli.command {
        Command::DetectChanges => {
            let report = governance.detect_changes()?;
            printer.emit(&report)?;
            Ok(Outcome::clean_if(report.is_clean()))
        }
        Command::Validate => {
            let report = governance.validate()?;
            printer.emit(&report)?;
            Ok(Outcome::clean_if(report.is_clean()))
        }
        Command::CreateAlias {
            old,
            new,
            reason,
            removal_date,
        } => {
            let mut request = AliasRequest::new(old, new, reason);
            if let Some(date) = removal_date {
                request = request.removal_date(*date);
            }
            let created = governance.create_alias(&request, today)?;
            printer.emit(&created)?;
            Ok(Outcome::Clean)
        }
        Command::GenerateMigrationGuide {
            old,
            new,
            reason,
            output,
        } => {
            let guide =
                governance.generate_migration_guide(old, new, reason, output.as_deref())?;
            printer.emit(&guide)?;
            Ok(Outcome::Clean)
        }
        Command::Resolve { name } => {
            let resolution = governance.resolve(name)?;
            if let Some(warning) = resolution.warning() {
                warn!(alias = warning.alias(), replacement = warning.replacement(), "resolved through a deprecation alias");
            }
            printer.emit_with(&format!("{resolution}\n"), &resolution)?;
            Ok(Outcome::clean_if(!matches!(resolution, Resolution::Unknown { .. })))
        }
        Command::List => {
            let document = governance.list()?;
            printer.emit_with(&render_catalog(&document), &document)?;
            Ok(Outcome::Clean)
        }
        Command::SetStatus { id, status } => {
            let transition = governance.set_status(id, *status)?;
            printer.emit(&transition)?;
            Ok(Outcome::Clean)
        }
        Command::RemoveAlias { old } => {
            let record = governance.remove_alias(old)?;
            let text = format!("alias removed: {old} -> {}\n", record.replacement());
            printer.emit_with(&text, &record)?;
            Ok(Outcome::Clean)
        }
        Command::RemoveToolset { id, force } => {
            let transition = governance.remove_toolset(id, *force, today)?;
            printer.emit(&transition)?;
            Ok(Outcome::Clean)
        }
        Command::ExpiredAliases => {
            let expired = governance.expired_aliases(today)?;
            let mut text = String::new();
            if expired.is_empty() {
                text.push_str("no expired aliases\n");
            }
            for alias in &expired {
                let _ = writeln!(text, "{alias}");
            }
            printer.emit_with(&text, &expired)?;
            Ok(Outcome::Clean)
        }
    }
}
