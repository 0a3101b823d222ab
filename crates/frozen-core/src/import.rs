use crate::export::{ExportFormat, DATE_FORMAT, TAG_SEPARATOR};
use crate::models::{NewItem, Tags};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads items back from CSV or JSON exports
///
/// CSV import is forgiving: a bad cell loses that value, a row without a
/// name or category is skipped, and only unreadable structure is an error.
pub struct Importer;

impl Importer {
    /// Import from a file, picking the format from its extension
    pub fn import_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<NewItem>> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            Error::InvalidArgument(
                "Could not determine import format from extension. Use .json or .csv".to_string(),
            )
        })?;
        Self::import_from_file_with_format(path, format)
    }

    pub fn import_from_file_with_format<P: AsRef<Path>>(
        path: P,
        format: ExportFormat,
    ) -> Result<Vec<NewItem>> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let items = match format {
            ExportFormat::Csv => Self::from_csv(&contents)?,
            ExportFormat::Json => Self::from_json(&contents)?,
            ExportFormat::Markdown => {
                return Err(Error::InvalidArgument(
                    "Markdown reports cannot be imported".to_string(),
                ))
            }
        };
        info!(
            "Read {} items from {}",
            items.len(),
            path.as_ref().display()
        );
        Ok(items)
    }

    /// Parse a JSON array of items; ids in the file are ignored
    pub fn from_json(contents: &str) -> Result<Vec<NewItem>> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Parse CSV in the export layout; the first record is the header
    ///
    /// Quotes only open a quoted field at the start of a field, so a stray
    /// `"` inside a hand-edited cell stays part of that cell.
    pub fn from_csv(contents: &str) -> Result<Vec<NewItem>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let mut items = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::Import {
                line: e.position().map_or(0, |p| p.line() as usize),
                message: e.to_string(),
            })?;
            let line = record.position().map_or(0, |p| p.line() as usize);

            if record.iter().all(|f| f.trim().is_empty()) {
                debug!("Skipping empty line {}", line);
                continue;
            }
            match Self::item_from_record(line, &record) {
                Some(item) => items.push(item),
                None => warn!(
                    "Line {} has insufficient fields ({}), skipping",
                    line,
                    record.len()
                ),
            }
        }

        debug!("CSV import parsed {} items", items.len());
        Ok(items)
    }

    fn item_from_record(line: usize, record: &csv::StringRecord) -> Option<NewItem> {
        let field = |index: usize| record.get(index).map(str::trim).unwrap_or("");
        // notes, weight and unit are free text and keep their spacing
        let text = |index: usize| {
            record
                .get(index)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
        };

        if record.len() < 3 || field(0).is_empty() || field(1).is_empty() {
            return None;
        }

        let quantity = match field(2).parse::<u32>() {
            Ok(q) if q > 0 => q,
            _ => {
                warn!("Invalid quantity '{}' on line {}, defaulting to 1", field(2), line);
                1
            }
        };

        let max_freeze_days = match field(9) {
            "" => None,
            raw => match raw.parse::<u32>() {
                Ok(days) if days > 0 => Some(days),
                _ => {
                    warn!("Invalid max freeze days '{}' on line {}, using default", raw, line);
                    None
                }
            },
        };

        Some(NewItem {
            name: field(0).to_string(),
            category: field(1).to_string(),
            quantity,
            date_frozen: parse_date(field(3), "date frozen", line),
            expiration_date: parse_date(field(4), "expiration date", line),
            max_freeze_days,
            notes: text(5),
            tags: field(6).split(TAG_SEPARATOR).collect::<Tags>(),
            weight: text(7),
            weight_unit: text(8),
        })
    }
}

fn parse_date(raw: &str, what: &str, line: usize) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Invalid {} '{}' on line {}, skipping date", what, raw, line);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{Exporter, CSV_HEADER};
    use crate::{CategoryDurationTable, ExpirationCalculator};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_csv_quoted_fields() {
        let csv = format!(
            "{}\n\"Lasagna, big\",Cooked Meals,1,,,\"say \"\"hi\"\"\nthen bye\",,,,\r\nPeas,Vegetables,2\n",
            CSV_HEADER
        );
        let items = Importer::from_csv(&csv).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Lasagna, big");
        assert_eq!(items[0].notes.as_deref(), Some("say \"hi\"\nthen bye"));
        assert_eq!(items[1].name, "Peas");
        assert_eq!(items[1].quantity, 2);
    }

    #[test]
    fn test_stray_quote_stays_in_its_own_cell() {
        let csv = format!(
            "{}\n5\" Patties,Beef,4\nPeas,Vegetables,1\nCorn \"x,Vegetables,2\n",
            CSV_HEADER
        );
        let items = Importer::from_csv(&csv).unwrap();

        let rows: Vec<_> = items
            .iter()
            .map(|i| (i.name.as_str(), i.category.as_str(), i.quantity))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("5\" Patties", "Beef", 4),
                ("Peas", "Vegetables", 1),
                ("Corn \"x", "Vegetables", 2),
            ]
        );
    }

    #[test]
    fn test_from_csv_lenient_rows() {
        let csv = format!(
            "{}\n\
             Steak,Beef,abc,2024-01-01,,,Raw;Meat,,,\n\
             \n\
             ,Beef,1\n\
             Peas,Vegetables\n\
             Soup,Cooked Meals,2,not-a-date,2024-02-30,Spicy,,1,qt,xyz\n",
            CSV_HEADER
        );
        let items = Importer::from_csv(&csv).unwrap();

        assert_eq!(items.len(), 2);

        let steak = &items[0];
        assert_eq!(steak.name, "Steak");
        assert_eq!(steak.quantity, 1);
        assert_eq!(steak.date_frozen, Some(date(2024, 1, 1)));
        assert_eq!(steak.expiration_date, None);
        assert_eq!(steak.tags.join(","), "Raw,Meat");
        assert_eq!(steak.notes, None);
        assert_eq!(steak.max_freeze_days, None);

        let soup = &items[1];
        assert_eq!(soup.quantity, 2);
        assert_eq!(soup.date_frozen, None);
        assert_eq!(soup.expiration_date, None);
        assert_eq!(soup.notes.as_deref(), Some("Spicy"));
        assert_eq!(soup.weight.as_deref(), Some("1"));
        assert_eq!(soup.weight_unit.as_deref(), Some("qt"));
        assert_eq!(soup.max_freeze_days, None);
    }

    #[test]
    fn test_csv_roundtrip_keeps_awkward_text() {
        let calc = ExpirationCalculator::new(Arc::new(CategoryDurationTable::new()));
        let original = calc
            .prepare(
                NewItem::new("Lasagna, family size", "Cooked Meals", 1)
                    .frozen_on(date(2024, 3, 1))
                    .tag("Dinner")
                    .tag("Leftover")
                    .notes("Line one\nLine \"two\"")
                    .weight("3", "lb"),
            )
            .unwrap();

        let csv = Exporter::to_csv(std::slice::from_ref(&original));
        let imported = Importer::from_csv(&csv).unwrap();
        assert_eq!(imported.len(), 1);

        let back = calc.prepare(imported[0].clone()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_from_json_ignores_ids() {
        let json = r#"[
            {"id": 42, "name": "Berries", "category": "Fruits", "quantity": 3,
             "dateFrozen": "2024-07-04", "expirationDate": null,
             "maxFreezeDays": 240, "tags": null, "weight": null,
             "weightUnit": null, "notes": null}
        ]"#;
        let items = Importer::from_json(json).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Berries");
        assert_eq!(items[0].date_frozen, Some(date(2024, 7, 4)));
        assert_eq!(items[0].max_freeze_days, Some(240));
        assert!(items[0].tags.is_empty());
    }

    #[test]
    fn test_json_roundtrip_through_exporter() {
        let calc = ExpirationCalculator::new(Arc::new(CategoryDurationTable::new()));
        let original = calc
            .prepare(NewItem::new("Cod", "Fish", 2).frozen_on(date(2024, 2, 2)).tag("Seafood"))
            .unwrap()
            .with_id(9);

        let json = Exporter::to_json(std::slice::from_ref(&original)).unwrap();
        let imported = Importer::from_json(&json).unwrap();
        let back = calc.prepare(imported[0].clone()).unwrap();

        assert_eq!(back, original.with_id(0));
    }

    #[test]
    fn test_import_rejects_markdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "# Freezer Inventory").unwrap();

        assert!(matches!(
            Importer::import_from_file(&path),
            Err(Error::InvalidArgument(_))
        ));
    }
}
