use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// When an item stops being safe to eat
///
/// `Unknown` behaves as "infinitely far in the future": it orders after every
/// known date and never lands in an urgent bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<NaiveDate>", into = "Option<NaiveDate>")]
pub enum Expiry {
    Known(NaiveDate),
    Unknown,
}

impl Expiry {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Expiry::Known(date) => Some(*date),
            Expiry::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Expiry::Known(_))
    }
}

impl Ord for Expiry {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Expiry::Known(a), Expiry::Known(b)) => a.cmp(b),
            (Expiry::Known(_), Expiry::Unknown) => Ordering::Less,
            (Expiry::Unknown, Expiry::Known(_)) => Ordering::Greater,
            (Expiry::Unknown, Expiry::Unknown) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Expiry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Option<NaiveDate>> for Expiry {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(Expiry::Unknown, Expiry::Known)
    }
}

impl From<Expiry> for Option<NaiveDate> {
    fn from(expiry: Expiry) -> Self {
        expiry.date()
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Expiry::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Labels attached to an item
///
/// Behaves like a set - duplicates are dropped and equality ignores order -
/// but keeps insertion order so labels display the way they were entered.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<String>>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a tag; blank and duplicate tags are ignored
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() || self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags joined with `separator`, in insertion order
    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl PartialEq for Tags {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|tag| other.contains(tag))
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

impl From<Option<Vec<String>>> for Tags {
    fn from(tags: Option<Vec<String>>) -> Self {
        tags.unwrap_or_default().into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

/// A frozen item as it lives in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Assigned by the store; `0` until the item has been saved
    #[serde(default)]
    pub(crate) id: i64,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub date_frozen: Option<NaiveDate>,
    #[serde(rename = "expirationDate", default = "unknown_expiry")]
    pub expiration: Expiry,
    pub max_freeze_days: u32,
    #[serde(default)]
    pub tags: Tags,
    pub weight: Option<String>,
    pub weight_unit: Option<String>,
    pub notes: Option<String>,
}

fn unknown_expiry() -> Expiry {
    Expiry::Unknown
}

/// Id carried by items that have not been stored yet
pub const UNSAVED_ID: i64 = 0;

impl InventoryItem {
    /// A bare, unsaved item; optional fields start empty and expiration unknown
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: u32,
        max_freeze_days: u32,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            category: category.into(),
            quantity,
            date_frozen: None,
            expiration: Expiry::Unknown,
            max_freeze_days,
            tags: Tags::new(),
            weight: None,
            weight_unit: None,
            notes: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// The same item under a store-assigned id
    ///
    /// Only the persistence layer hands out ids. Edits to a stored item go
    /// through [`ExpirationCalculator::prepare_update`](crate::ExpirationCalculator::prepare_update),
    /// which keeps the id it already has.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// "<weight> <unit>", only when both halves are present
    pub fn formatted_weight(&self) -> Option<String> {
        match (&self.weight, &self.weight_unit) {
            (Some(weight), Some(unit)) => Some(format!("{} {}", weight, unit)),
            _ => None,
        }
    }
}

/// User input for a new item, before defaults are filled in
///
/// Turn it into an [`InventoryItem`] with
/// [`ExpirationCalculator::prepare`](crate::ExpirationCalculator::prepare).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub date_frozen: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    /// Falls back to the category's shelf-life when absent
    pub max_freeze_days: Option<u32>,
    pub tags: Tags,
    pub weight: Option<String>,
    pub weight_unit: Option<String>,
    pub notes: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            quantity,
            ..Default::default()
        }
    }

    pub fn frozen_on(mut self, date: NaiveDate) -> Self {
        self.date_frozen = Some(date);
        self
    }

    pub fn expires_on(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn max_freeze_days(mut self, days: u32) -> Self {
        self.max_freeze_days = Some(days);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn weight(mut self, weight: impl Into<String>, unit: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self.weight_unit = Some(unit.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<InventoryItem> for NewItem {
    fn from(item: InventoryItem) -> Self {
        Self {
            name: item.name,
            category: item.category,
            quantity: item.quantity,
            date_frozen: item.date_frozen,
            expiration_date: item.expiration.date(),
            max_freeze_days: Some(item.max_freeze_days),
            tags: item.tags,
            weight: item.weight,
            weight_unit: item.weight_unit,
            notes: item.notes,
        }
    }
}
