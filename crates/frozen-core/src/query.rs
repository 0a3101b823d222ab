use crate::expiration::{ExpirationCalculator, ExpirationStatus};
use crate::models::{Expiry, InventoryItem};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Window used to flag items that need attention soon
pub const DEFAULT_HORIZON_DAYS: u32 = 60;

/// Direction for expiration ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Soonest expiration first
    #[default]
    Ascending,
    /// Latest expiration first
    Descending,
}

/// Order items by expiration date
///
/// Unknown expirations go last whichever way you sort. The sort is stable, so
/// items with the same key keep the order they came in (the store hands them
/// out by id).
pub fn sort_by_expiration<'a, I>(items: I, order: SortOrder) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let mut sorted: Vec<_> = items.into_iter().collect();
    sorted.sort_by(|a, b| compare_expiry(a.expiration, b.expiration, order));
    sorted
}

fn compare_expiry(a: Expiry, b: Expiry, order: SortOrder) -> Ordering {
    match (a, b) {
        (Expiry::Known(a), Expiry::Known(b)) => match order {
            SortOrder::Ascending => a.cmp(&b),
            SortOrder::Descending => b.cmp(&a),
        },
        // Unknown is "infinitely far away" but still trails in descending order
        _ => a.is_known().cmp(&b.is_known()).reverse(),
    }
}

/// Items in exactly this category (case-sensitive)
pub fn filter_by_category<'a, I>(items: I, category: &str) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    items
        .into_iter()
        .filter(|item| item.category == category)
        .collect()
}

/// Items expiring on or before `today + horizon_days`, expired ones included
pub fn filter_near_expiration<'a, I>(
    items: I,
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let threshold = today
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);

    items
        .into_iter()
        .filter(|item| matches!(item.expiration, Expiry::Known(date) if date <= threshold))
        .collect()
}

/// Case-insensitive substring match on name or category
///
/// An empty query matches everything.
pub fn search<'a, I>(items: I, query: &str) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            needle.is_empty()
                || item.name.to_lowercase().contains(&needle)
                || item.category.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Distinct categories in first-seen order
pub fn categories<'a, I>(items: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item.category.as_str()) {
            seen.push(&item.category);
        }
    }
    seen
}

/// A list-screen query: filters first, then ordering
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    /// Only items expiring within this many days
    pub near_expiration: Option<u32>,
    pub order: SortOrder,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn near_expiration(mut self, horizon_days: u32) -> Self {
        self.near_expiration = Some(horizon_days);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Run the query over a snapshot of items
    pub fn apply<'a>(&self, items: &'a [InventoryItem], today: NaiveDate) -> Vec<&'a InventoryItem> {
        let mut selected: Vec<&InventoryItem> = items.iter().collect();

        if let Some(category) = &self.category {
            selected = filter_by_category(selected, category);
        }
        if let Some(query) = &self.search {
            selected = search(selected, query);
        }
        if let Some(horizon) = self.near_expiration {
            selected = filter_near_expiration(selected, today, horizon);
        }

        sort_by_expiration(selected, self.order)
    }
}

/// Item counts by status bucket and category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub total_items: usize,
    /// Sum of quantities across all items
    pub total_quantity: u64,
    pub by_status: BTreeMap<ExpirationStatus, usize>,
    pub by_category: BTreeMap<String, usize>,
}

impl InventorySummary {
    pub fn from_items<'a, I>(items: I, calculator: &ExpirationCalculator, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a InventoryItem>,
    {
        let mut summary = Self::default();
        for item in items {
            summary.total_items += 1;
            summary.total_quantity += u64::from(item.quantity);
            *summary
                .by_status
                .entry(calculator.item_status(item, today))
                .or_insert(0) += 1;
            *summary.by_category.entry(item.category.clone()).or_insert(0) += 1;
        }
        summary
    }

    pub fn count(&self, status: ExpirationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Everything that is not Normal
    pub fn needs_attention(&self) -> usize {
        self.count(ExpirationStatus::Expired)
            + self.count(ExpirationStatus::Critical)
            + self.count(ExpirationStatus::Warning)
    }
}
