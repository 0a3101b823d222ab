use crate::expiration::{countdown_text, ExpirationCalculator, ExpirationStatus};
use crate::models::InventoryItem;
use crate::query::{sort_by_expiration, InventorySummary, SortOrder};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: &str =
    "Name,Category,Quantity,Date Frozen,Expiration Date,Notes,Tags,Weight,Weight Unit,Max Freeze Days";

/// Separator used for tags inside the single CSV tags column
pub const TAG_SEPARATOR: &str = ";";

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    /// Format implied by a file name
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Writes inventory snapshots out as JSON, CSV or a Markdown report
pub struct Exporter;

impl Exporter {
    /// Export items to a file, picking the format from its extension
    pub fn export_to_file<P: AsRef<Path>>(
        items: &[InventoryItem],
        path: P,
        calculator: &ExpirationCalculator,
        today: NaiveDate,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            Error::InvalidArgument(
                "Could not determine export format from extension. Use .json, .csv, or .md"
                    .to_string(),
            )
        })?;

        Self::export_to_file_with_format(items, path, format, calculator, today)
    }

    pub fn export_to_file_with_format<P: AsRef<Path>>(
        items: &[InventoryItem],
        path: P,
        format: ExportFormat,
        calculator: &ExpirationCalculator,
        today: NaiveDate,
    ) -> Result<()> {
        let content = match format {
            ExportFormat::Json => Self::to_json(items)?,
            ExportFormat::Csv => Self::to_csv(items),
            ExportFormat::Markdown => Self::to_markdown(items, calculator, today),
        };

        let mut file = File::create(path.as_ref())?;
        file.write_all(content.as_bytes())?;

        info!(
            "Exported {} items to {} as {}",
            items.len(),
            path.as_ref().display(),
            format.extension()
        );
        Ok(())
    }

    /// Pretty JSON array with camelCase keys
    pub fn to_json(items: &[InventoryItem]) -> Result<String> {
        Ok(serde_json::to_string_pretty(items)?)
    }

    pub fn to_csv(items: &[InventoryItem]) -> String {
        let mut output = String::new();
        output.push_str(CSV_HEADER);
        output.push('\n');

        for item in items {
            output.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                Self::escape_csv(&item.name),
                Self::escape_csv(&item.category),
                item.quantity,
                item.date_frozen
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                item.expiration
                    .date()
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                Self::escape_csv(item.notes.as_deref().unwrap_or("")),
                Self::escape_csv(&item.tags.join(TAG_SEPARATOR)),
                Self::escape_csv(item.weight.as_deref().unwrap_or("")),
                Self::escape_csv(item.weight_unit.as_deref().unwrap_or("")),
                item.max_freeze_days,
            ));
        }

        output
    }

    /// Human-readable report, soonest expiration first
    pub fn to_markdown(
        items: &[InventoryItem],
        calculator: &ExpirationCalculator,
        today: NaiveDate,
    ) -> String {
        let mut output = String::new();

        output.push_str("# Freezer Inventory\n\n");
        output.push_str(&format!(
            "As of {} - {} items\n\n",
            today.format(DATE_FORMAT),
            items.len()
        ));
        output.push_str("---\n\n");

        for item in sort_by_expiration(items, SortOrder::Ascending) {
            let days = calculator.days_until_expiration(item.expiration, today);
            let status = calculator.status_bucket(days);

            output.push_str(&format!("## {}\n\n", item.name));
            output.push_str(&format!(
                "**Status:** {} {} | **Category:** {}\n\n",
                Self::status_badge(status),
                status.label(),
                item.category
            ));

            output.push_str("| Field | Value |\n");
            output.push_str("|-------|-------|\n");
            output.push_str(&format!("| Quantity | {} |\n", item.quantity));
            if let Some(weight) = item.formatted_weight() {
                output.push_str(&format!("| Weight | {} |\n", weight));
            }
            output.push_str(&format!(
                "| Frozen | {} |\n",
                item.date_frozen
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| "Unknown".to_string())
            ));
            output.push_str(&format!("| Expires | {} |\n", item.expiration));
            output.push_str(&format!("| Countdown | {} |\n", countdown_text(days)));

            if !item.tags.is_empty() {
                output.push_str("\n**Tags:** ");
                let tags: Vec<_> = item.tags.iter().map(|t| format!("`{}`", t)).collect();
                output.push_str(&tags.join(", "));
                output.push('\n');
            }

            if let Some(notes) = item.notes.as_deref().filter(|n| !n.is_empty()) {
                output.push_str(&format!("\n{}\n", notes));
            }

            output.push_str("\n---\n\n");
        }

        if !items.is_empty() {
            let summary = InventorySummary::from_items(items, calculator, today);

            output.push_str("## Summary\n\n");
            output.push_str(&format!("- Total quantity: {}\n", summary.total_quantity));
            for status in ExpirationStatus::all() {
                output.push_str(&format!(
                    "- {} {}: {}\n",
                    Self::status_badge(status),
                    status.label(),
                    summary.count(status)
                ));
            }

            output.push_str("\n### Categories\n\n");
            for (category, count) in &summary.by_category {
                output.push_str(&format!("- {}: {}\n", category, count));
            }
        }

        output
    }

    fn status_badge(status: ExpirationStatus) -> &'static str {
        match status {
            ExpirationStatus::Expired => "⚫",
            ExpirationStatus::Critical => "🔴",
            ExpirationStatus::Warning => "🟡",
            ExpirationStatus::Normal => "🟢",
        }
    }

    /// Escape CSV special characters
    pub(crate) fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
