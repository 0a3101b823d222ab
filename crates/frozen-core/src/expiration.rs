use crate::category::CategoryDurationTable;
use crate::models::{Expiry, InventoryItem, NewItem, UNSAVED_ID};
use crate::{Error, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Days-until value reported for items without an expiration date
pub const NEVER_EXPIRES: i64 = i64::MAX;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// How urgently an item needs eating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExpirationStatus {
    /// Past its expiration date
    Expired,
    /// Expires within the critical window (two weeks by default)
    Critical,
    /// Expires within the warning window (two months by default)
    Warning,
    /// Plenty of time left, or no expiration date at all
    Normal,
}

impl ExpirationStatus {
    /// Bucket using the default 14/60 day thresholds
    pub fn from_days(days_until: i64) -> Self {
        ExpirationThresholds::default().bucket(days_until)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpirationStatus::Expired => "Expired",
            ExpirationStatus::Critical => "Critical",
            ExpirationStatus::Warning => "Warning",
            ExpirationStatus::Normal => "Normal",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            ExpirationStatus::Expired => "gray",
            ExpirationStatus::Critical => "red",
            ExpirationStatus::Warning => "yellow",
            ExpirationStatus::Normal => "green",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ExpirationStatus::Expired => "✗",
            ExpirationStatus::Critical => "!",
            ExpirationStatus::Warning => "○",
            ExpirationStatus::Normal => "✓",
        }
    }

    pub fn all() -> [ExpirationStatus; 4] {
        [
            ExpirationStatus::Expired,
            ExpirationStatus::Critical,
            ExpirationStatus::Warning,
            ExpirationStatus::Normal,
        ]
    }
}

/// Upper bounds (inclusive) of the critical and warning buckets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpirationThresholds {
    pub critical_days: i64,
    pub warning_days: i64,
}

impl Default for ExpirationThresholds {
    fn default() -> Self {
        Self {
            critical_days: 14,
            warning_days: 60,
        }
    }
}

impl ExpirationThresholds {
    /// Boundaries belong to the more urgent bucket: exactly 14 days is
    /// critical, exactly 60 is a warning.
    pub fn bucket(&self, days_until: i64) -> ExpirationStatus {
        match days_until {
            d if d < 0 => ExpirationStatus::Expired,
            d if d <= self.critical_days => ExpirationStatus::Critical,
            d if d <= self.warning_days => ExpirationStatus::Warning,
            _ => ExpirationStatus::Normal,
        }
    }
}

/// Signed whole days from `today` until `expiry`
///
/// Returns [`NEVER_EXPIRES`] when the expiration date is unknown.
pub fn days_until_expiration(expiry: Expiry, today: NaiveDate) -> i64 {
    match expiry {
        Expiry::Known(date) => (date - today).num_days(),
        Expiry::Unknown => NEVER_EXPIRES,
    }
}

/// Like [`days_until_expiration`] but against an instant
///
/// The expiration date is taken as midnight UTC and the millisecond gap is
/// floor-divided, so an item expiring later today already counts as -1 once
/// midnight has passed.
pub fn days_until_expiration_at(expiry: Expiry, now: DateTime<Utc>) -> i64 {
    match expiry {
        Expiry::Known(date) => {
            let expires_at = date.and_time(NaiveTime::MIN).and_utc();
            let millis = expires_at.timestamp_millis() - now.timestamp_millis();
            millis.div_euclid(MILLIS_PER_DAY)
        }
        Expiry::Unknown => NEVER_EXPIRES,
    }
}

/// Human countdown shown next to an item
pub fn countdown_text(days_until: i64) -> String {
    match days_until {
        NEVER_EXPIRES => "NEVER EXPIRES".to_string(),
        d if d < 0 => format!("{} DAYS EXPIRED", d.unsigned_abs()),
        d => format!("EXPIRES IN {} DAYS", d),
    }
}

/// Expiration rules driven by a shared category duration table
#[derive(Debug, Clone)]
pub struct ExpirationCalculator {
    durations: Arc<CategoryDurationTable>,
    thresholds: ExpirationThresholds,
}

impl ExpirationCalculator {
    pub fn new(durations: Arc<CategoryDurationTable>) -> Self {
        Self {
            durations,
            thresholds: ExpirationThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ExpirationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn durations(&self) -> &CategoryDurationTable {
        &self.durations
    }

    pub fn thresholds(&self) -> ExpirationThresholds {
        self.thresholds
    }

    /// Freeze date plus the category's shelf-life
    pub fn compute_expiration(&self, date_frozen: NaiveDate, category: &str) -> NaiveDate {
        add_days(date_frozen, self.durations.duration_days(category))
    }

    pub fn days_until_expiration(&self, expiry: Expiry, today: NaiveDate) -> i64 {
        days_until_expiration(expiry, today)
    }

    pub fn status_bucket(&self, days_until: i64) -> ExpirationStatus {
        self.thresholds.bucket(days_until)
    }

    /// Bucket for an expiration date as of `today`; unknown dates are Normal
    pub fn status(&self, expiry: Expiry, today: NaiveDate) -> ExpirationStatus {
        self.status_bucket(days_until_expiration(expiry, today))
    }

    pub fn item_status(&self, item: &InventoryItem, today: NaiveDate) -> ExpirationStatus {
        self.status(item.expiration, today)
    }

    /// Validate user input and fill in the derived fields
    ///
    /// `max_freeze_days` defaults to the category's shelf-life. When no
    /// expiration date was supplied it becomes `date_frozen + max_freeze_days`,
    /// or stays unknown if the freeze date is missing too.
    pub fn prepare(&self, new: NewItem) -> Result<InventoryItem> {
        let name = new.name.trim().to_string();
        let category = new.category.trim().to_string();

        if name.is_empty() {
            return Err(Error::MissingData("item name is required".to_string()));
        }
        if category.is_empty() {
            return Err(Error::MissingData(format!("category is required for '{}'", name)));
        }
        if new.quantity == 0 {
            return Err(Error::InvalidArgument(format!(
                "quantity for '{}' must be positive",
                name
            )));
        }

        let max_freeze_days = match new.max_freeze_days {
            Some(0) => {
                return Err(Error::InvalidArgument(format!(
                    "max freeze days for '{}' must be positive",
                    name
                )))
            }
            Some(days) => days,
            None => self.durations.duration_days(&category),
        };

        let expiration = match (new.expiration_date, new.date_frozen) {
            (Some(expires), Some(frozen)) if expires < frozen => {
                return Err(Error::InvalidArgument(format!(
                    "'{}' expires ({}) before it was frozen ({})",
                    name, expires, frozen
                )))
            }
            (Some(expires), _) => Expiry::Known(expires),
            (None, Some(frozen)) => Expiry::Known(add_days(frozen, max_freeze_days)),
            (None, None) => Expiry::Unknown,
        };

        debug!(
            "Prepared {} ({}): max {} days, expires {}",
            name, category, max_freeze_days, expiration
        );

        Ok(InventoryItem {
            id: UNSAVED_ID,
            name,
            category,
            quantity: new.quantity,
            date_frozen: new.date_frozen,
            expiration,
            max_freeze_days,
            tags: new.tags,
            weight: new.weight,
            weight_unit: new.weight_unit,
            notes: new.notes,
        })
    }

    /// Like [`prepare`](Self::prepare), for edits to an item already in the store
    ///
    /// The result keeps `existing`'s id; an unsaved `existing` is rejected.
    pub fn prepare_update(&self, existing: &InventoryItem, edited: NewItem) -> Result<InventoryItem> {
        if !existing.is_saved() {
            return Err(Error::InvalidArgument(format!(
                "'{}' has not been stored yet",
                existing.name
            )));
        }
        Ok(InventoryItem {
            id: existing.id,
            ..self.prepare(edited)?
        })
    }
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
