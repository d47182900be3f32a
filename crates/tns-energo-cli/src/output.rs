//! Output formatting and writing utilities
//!
//! This module formats command results as JSON, YAML or human-readable
//! tables, and owns the spinner shown while requests are in flight.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;
use tns_energo_core::endpoints::accounts::AccountDetails;
use tns_energo_core::endpoints::send_readings::ReadingsResultData;
use tns_energo_core::{Account, Indication, Meter, Payment};
use tracing::{debug, trace};

/// Trait for formatting serializable output
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human output is rendered by the handlers; this is the fallback
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, progress: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: progress && !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Whether results should be rendered as tables and summaries
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!("Outputting data: {}", value_json);

        let formatted = self.format.format(value)?;

        match self.format {
            OutputFormat::Yaml => self.write(&formatted),
            _ => self.writeln(&formatted),
        }
    }

    /// Aligned `label: value` lines
    pub fn key_values(&mut self, pairs: &[(&str, String)]) -> Result<()> {
        let width = pairs
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);

        for (label, value) in pairs {
            let padded = format!("{:width$}", label, width = width);
            let line = if self.use_color {
                format!("{}  {}", padded.bold(), value)
            } else {
                format!("{}  {}", padded, value)
            };
            self.writeln(&line)?;
        }

        Ok(())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        // Column widths in characters; account data is mostly Cyrillic
        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(&header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i < widths.len() {
                        format!("{:width$}", cell, width = widths[i])
                    } else {
                        cell.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub const ACCOUNT_HEADERS: &[&str] = &["Account", "Address", "Balance", "Controlled by"];
pub const METER_HEADERS: &[&str] = &["Meter", "Model", "Zone", "Name", "Last reading", "Taken on"];
pub const PAYMENT_HEADERS: &[&str] = &["Paid at", "Amount", "Source", "Transaction"];
pub const INDICATION_HEADERS: &[&str] = &["Taken on", "Meter", "Status", "Zones"];

fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn money(value: f64) -> String {
    // avoid printing "-0.00" for a zero debt
    format!("{:.2}", value + 0.0)
}

fn day(date: Option<chrono::NaiveDate>) -> String {
    or_dash(date.map(|d| d.format("%d.%m.%Y")))
}

/// One row per account
pub fn account_rows(accounts: &[Account]) -> Vec<Vec<String>> {
    accounts
        .iter()
        .map(|account| {
            vec![
                account.code.clone(),
                or_dash(account.address.as_ref()),
                money(account.balance()),
                or_dash(account.controlled_by_code.as_ref()),
            ]
        })
        .collect()
}

/// Summary lines for the logged-in account
pub fn account_summary(account: &Account) -> Vec<(&'static str, String)> {
    let invoices = match (&account.digital_invoices_email, account.digital_invoices_enabled) {
        (Some(email), true) => format!("enabled ({email})"),
        (None, true) => "enabled".to_string(),
        _ => "disabled".to_string(),
    };

    vec![
        ("Account", account.code.clone()),
        ("Address", or_dash(account.address.as_ref())),
        ("Balance", money(account.balance())),
        ("Email", or_dash(account.email.as_ref())),
        ("Digital invoices", invoices),
    ]
}

/// Summary lines for `getInfo` details
pub fn details_summary(details: &AccountDetails) -> Vec<(&'static str, String)> {
    vec![
        ("Address", details.address.clone()),
        ("Contact", or_dash(details.contact.as_ref())),
        ("People registered", details.people_registered.to_string()),
        ("Total area", or_dash(details.total_area)),
        ("Living area", or_dash(details.living_area)),
        ("Living category", or_dash(details.living_category.as_ref())),
        ("Digital receipt", details.invoice_is_digital.to_string()),
        ("Meters", details.meters.len().to_string()),
    ]
}

/// One row per meter zone, the meter columns filled on its first zone only
pub fn meter_rows(meters: &BTreeMap<String, Meter>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for meter in meters.values() {
        for (position, (key, zone)) in meter.zones.iter().enumerate() {
            let (code, model, taken_on) = if position == 0 {
                (meter.code.clone(), meter.model.clone(), day(meter.last_indications_date))
            } else {
                (String::new(), String::new(), String::new())
            };

            rows.push(vec![
                code,
                model,
                key.clone(),
                or_dash(zone.name.as_ref()),
                or_dash(zone.last_indication),
                taken_on,
            ]);
        }
    }

    rows
}

/// One row per payment, newest first
pub fn payment_rows(payments: &[Payment]) -> Vec<Vec<String>> {
    let mut sorted: Vec<&Payment> = payments.iter().collect();
    sorted.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));

    sorted
        .into_iter()
        .map(|payment| {
            vec![
                payment.paid_at.format("%d.%m.%Y %H:%M").to_string(),
                money(payment.amount),
                payment.source.clone(),
                or_dash(payment.transaction_id.as_ref()),
            ]
        })
        .collect()
}

/// One row per indication, zones joined as `t1=…, t2=…`
pub fn indication_rows(indications: &[Indication]) -> Vec<Vec<String>> {
    indications
        .iter()
        .map(|indication| {
            let zones = indication
                .zones
                .iter()
                .map(|(zone, value)| format!("{zone}={value}"))
                .collect::<Vec<_>>()
                .join(", ");

            vec![
                indication.taken_on.format("%d.%m.%Y").to_string(),
                indication.meter_code.clone(),
                indication.status.to_string(),
                zones,
            ]
        })
        .collect()
}

/// Balance lines returned after a reading submission
pub fn submission_summary(data: &ReadingsResultData) -> Vec<(&'static str, String)> {
    vec![
        ("Period", data.period.format("%m.%Y").to_string()),
        ("Charged by meter", money(data.charged_meter)),
        ("Recalculations", money(data.recalculations)),
        ("Paid", money(data.paid)),
        ("Debt", money(data.debt)),
        ("To pay", money(data.total)),
    ]
}
