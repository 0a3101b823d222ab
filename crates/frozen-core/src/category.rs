use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Shelf-life used for any category the table has never heard of
pub const DEFAULT_DURATION_DAYS: u32 = 180;

pub const CHICKEN: &str = "Chicken";
pub const BEEF: &str = "Beef";
pub const PORK: &str = "Pork";
pub const FISH: &str = "Fish";
pub const COOKED_MEALS: &str = "Cooked Meals";
pub const VEGETABLES: &str = "Vegetables";
pub const FRUITS: &str = "Fruits";
pub const OTHER: &str = "Other";

/// Built-in categories with their freezer shelf-life in days (USDA guidance)
const BUILT_IN_DURATIONS: [(&str, u32); 8] = [
    (CHICKEN, 270),
    (BEEF, 365),
    (PORK, 180),
    (FISH, 180),
    (COOKED_MEALS, 90),
    (VEGETABLES, 240),
    (FRUITS, 240),
    (OTHER, 90),
];

/// Tag suggestions offered when recording an item
pub const COMMON_TAGS: [&str; 14] = [
    "Raw",
    "Cooked",
    "Leftover",
    "Meal Prep",
    "Breakfast",
    "Lunch",
    "Dinner",
    "Dessert",
    "Snack",
    "Organic",
    "Veggie",
    "Fruit",
    "Meat",
    "Seafood",
];

/// The default categories in display order
pub fn default_categories() -> Vec<&'static str> {
    BUILT_IN_DURATIONS.iter().map(|(name, _)| *name).collect()
}

/// Category name -> default shelf-life in days
///
/// Overrides live only as long as the table does. Reads take a shared lock,
/// so the table can sit behind an `Arc` and be consulted from any thread
/// while an override is applied.
#[derive(Debug)]
pub struct CategoryDurationTable {
    durations: RwLock<HashMap<String, u32>>,
}

impl CategoryDurationTable {
    /// A table holding only the built-in durations
    pub fn new() -> Self {
        Self {
            durations: RwLock::new(Self::built_ins()),
        }
    }

    fn built_ins() -> HashMap<String, u32> {
        BUILT_IN_DURATIONS
            .iter()
            .map(|(name, days)| (name.to_string(), *days))
            .collect()
    }

    /// Shelf-life for a category, falling back to 180 days
    pub fn duration_days(&self, category: &str) -> u32 {
        self.durations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_DURATION_DAYS)
    }

    /// Override the shelf-life for a category
    ///
    /// Non-positive durations are rejected and leave the table untouched.
    pub fn set_duration(&self, category: &str, days: i64) -> Result<()> {
        if days <= 0 {
            return Err(Error::InvalidArgument(format!(
                "duration for '{}' must be positive, got {}",
                category, days
            )));
        }
        let days = u32::try_from(days).map_err(|_| {
            Error::InvalidArgument(format!("duration for '{}' is too large: {}", category, days))
        })?;

        debug!("Setting duration for {} to {} days", category, days);
        self.durations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(category.to_string(), days);
        Ok(())
    }

    /// Drop every override and go back to the built-ins
    pub fn reset(&self) {
        *self.durations.write().unwrap_or_else(PoisonError::into_inner) = Self::built_ins();
    }

    /// Snapshot of all known categories, sorted by name
    pub fn entries(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<_> = self
            .durations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, days)| (name.clone(), *days))
            .collect();
        entries.sort();
        entries
    }
}

impl Default for CategoryDurationTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_built_in_durations() {
        let table = CategoryDurationTable::new();
        assert_eq!(table.duration_days("Chicken"), 270);
        assert_eq!(table.duration_days("Beef"), 365);
        assert_eq!(table.duration_days("Pork"), 180);
        assert_eq!(table.duration_days("Fish"), 180);
        assert_eq!(table.duration_days("Cooked Meals"), 90);
        assert_eq!(table.duration_days("Vegetables"), 240);
        assert_eq!(table.duration_days("Fruits"), 240);
        assert_eq!(table.duration_days("Other"), 90);
    }

    #[test]
    fn test_unknown_category_uses_default() {
        let table = CategoryDurationTable::new();
        assert_eq!(table.duration_days("Ice Cream"), DEFAULT_DURATION_DAYS);
        // lookups are case-sensitive
        assert_eq!(table.duration_days("beef"), DEFAULT_DURATION_DAYS);
    }

    #[test]
    fn test_set_duration_override() {
        let table = CategoryDurationTable::new();
        table.set_duration("Beef", 400).unwrap();
        table.set_duration("Ice Cream", 60).unwrap();

        assert_eq!(table.duration_days("Beef"), 400);
        assert_eq!(table.duration_days("Ice Cream"), 60);
    }

    #[test]
    fn test_set_duration_rejects_non_positive() {
        let table = CategoryDurationTable::new();

        assert!(matches!(
            table.set_duration("Beef", 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            table.set_duration("Beef", -30),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(table.duration_days("Beef"), 365);
    }

    #[test]
    fn test_reset_restores_built_ins() {
        let table = CategoryDurationTable::new();
        table.set_duration("Fish", 10).unwrap();
        table.set_duration("Soup", 10).unwrap();
        table.reset();

        assert_eq!(table.duration_days("Fish"), 180);
        assert!(table.entries().iter().all(|(name, _)| name != "Soup"));
    }

    #[test]
    fn test_entries_sorted() {
        let table = CategoryDurationTable::new();
        let names: Vec<_> = table.entries().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_shared_across_threads() {
        let table = Arc::new(CategoryDurationTable::new());

        let writer = {
            let table = Arc::clone(&table);
            thread::spawn(move || table.set_duration("Pork", 200).unwrap())
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    let days = table.duration_days("Pork");
                    assert!(days == 180 || days == 200);
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(table.duration_days("Pork"), 200);
    }

    #[test]
    fn test_default_categories_order() {
        assert_eq!(
            default_categories(),
            vec![
                "Chicken",
                "Beef",
                "Pork",
                "Fish",
                "Cooked Meals",
                "Vegetables",
                "Fruits",
                "Other"
            ]
        );
    }
}
