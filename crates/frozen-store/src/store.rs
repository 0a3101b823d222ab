use crate::{Result, StoreError};
use chrono::NaiveDate;
use frozen_core::{Expiry, InventoryItem, Tags};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT id, name, category, quantity, notes, max_freeze_days, \
     date_frozen, expiration_date, tags, weight, weight_unit FROM inventory_items";

/// Persistent home for inventory items
///
/// Listings come back ordered by id, which is what the query layer's stable
/// sort relies on for tie-breaks.
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Open (or create) the database file, creating parent directories
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Opening item store at {}", db_path.display());
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // Initialize schema on first run
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS inventory_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                notes TEXT,
                max_freeze_days INTEGER NOT NULL,
                date_frozen TEXT,
                expiration_date TEXT,
                tags TEXT,
                weight TEXT,
                weight_unit TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_inventory_items_category
             ON inventory_items(category)",
            [],
        )?;

        Ok(())
    }

    /// Store a new item and hand it back with its assigned id
    ///
    /// Whatever id the item carried is ignored.
    pub fn insert(&self, item: &InventoryItem) -> Result<InventoryItem> {
        Self::insert_with(&self.conn, item)
    }

    fn insert_with(conn: &Connection, item: &InventoryItem) -> Result<InventoryItem> {
        conn.execute(
            "INSERT INTO inventory_items
                (name, category, quantity, notes, max_freeze_days,
                 date_frozen, expiration_date, tags, weight, weight_unit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                item.name,
                item.category,
                item.quantity,
                item.notes,
                item.max_freeze_days,
                format_date(item.date_frozen),
                format_date(item.expiration.date()),
                serde_json::to_string(&item.tags)?,
                item.weight,
                item.weight_unit,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted {} as #{}", item.name, id);
        Ok(item.clone().with_id(id))
    }

    /// Bulk insert in a single transaction; all or nothing
    pub fn insert_all(&mut self, items: &[InventoryItem]) -> Result<Vec<InventoryItem>> {
        let tx = self.conn.transaction()?;
        let stored = items
            .iter()
            .map(|item| Self::insert_with(&tx, item))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        info!("Inserted {} items", stored.len());
        Ok(stored)
    }

    /// Replace every field of an existing item
    pub fn update(&self, item: &InventoryItem) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE inventory_items SET
                name = ?2, category = ?3, quantity = ?4, notes = ?5, max_freeze_days = ?6,
                date_frozen = ?7, expiration_date = ?8, tags = ?9, weight = ?10, weight_unit = ?11
             WHERE id = ?1",
            params![
                item.id(),
                item.name,
                item.category,
                item.quantity,
                item.notes,
                item.max_freeze_days,
                format_date(item.date_frozen),
                format_date(item.expiration.date()),
                serde_json::to_string(&item.tags)?,
                item.weight,
                item.weight_unit,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(item.id()));
        }
        debug!("Updated #{}", item.id());
        Ok(())
    }

    pub fn update_notes(&self, id: i64, notes: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE inventory_items SET notes = ?2 WHERE id = ?1",
            params![id, notes],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM inventory_items WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!("Deleted #{}", id);
        Ok(())
    }

    /// Delete several items at once; unknown ids are skipped
    ///
    /// Returns how many rows were actually removed.
    pub fn delete_many(&mut self, ids: &[i64]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM inventory_items WHERE id = ?1")?;
            for id in ids {
                removed += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        info!("Deleted {} of {} requested items", removed, ids.len());
        Ok(removed)
    }

    pub fn get(&self, id: i64) -> Result<InventoryItem> {
        let raw = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                RawItem::from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        raw.into_item()
    }

    /// Every item, ordered by id
    pub fn list(&self) -> Result<Vec<InventoryItem>> {
        self.query_items(&format!("{} ORDER BY id", SELECT_COLUMNS), &[])
    }

    pub fn list_by_category(&self, category: &str) -> Result<Vec<InventoryItem>> {
        self.query_items(
            &format!("{} WHERE category = ?1 ORDER BY id", SELECT_COLUMNS),
            &[&category],
        )
    }

    fn query_items(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<InventoryItem>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, RawItem::from_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.into_item()?);
        }
        Ok(items)
    }

    /// Distinct categories currently in use, alphabetically
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM inventory_items ORDER BY category")?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(categories)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM inventory_items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_by_category(&self, category: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM inventory_items WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Row exactly as SQLite holds it, before dates and tags are decoded
struct RawItem {
    id: i64,
    name: String,
    category: String,
    quantity: u32,
    notes: Option<String>,
    max_freeze_days: u32,
    date_frozen: Option<String>,
    expiration_date: Option<String>,
    tags: Option<String>,
    weight: Option<String>,
    weight_unit: Option<String>,
}

impl RawItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            quantity: row.get(3)?,
            notes: row.get(4)?,
            max_freeze_days: row.get(5)?,
            date_frozen: row.get(6)?,
            expiration_date: row.get(7)?,
            tags: row.get(8)?,
            weight: row.get(9)?,
            weight_unit: row.get(10)?,
        })
    }

    fn into_item(self) -> Result<InventoryItem> {
        let id = self.id;
        let parse = |raw: Option<String>| -> Result<Option<NaiveDate>> {
            raw.map(|text| {
                NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| StoreError::InvalidRow {
                    id,
                    message: format!("bad date '{}': {}", text, e),
                })
            })
            .transpose()
        };

        let tags: Tags = match self.tags {
            Some(json) => serde_json::from_str(&json)?,
            None => Tags::new(),
        };

        let mut item =
            InventoryItem::new(self.name, self.category, self.quantity, self.max_freeze_days);
        item.notes = self.notes;
        item.date_frozen = parse(self.date_frozen)?;
        item.expiration = Expiry::from(parse(self.expiration_date)?);
        item.tags = tags;
        item.weight = self.weight;
        item.weight_unit = self.weight_unit;
        Ok(item.with_id(id))
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frozen_core::{CategoryDurationTable, ExpirationCalculator, NewItem};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prepared(name: &str, category: &str) -> InventoryItem {
        ExpirationCalculator::new(Arc::new(CategoryDurationTable::new()))
            .prepare(
                NewItem::new(name, category, 2)
                    .frozen_on(date(2024, 1, 15))
                    .tag("Raw")
                    .tag("Meat")
                    .weight("2", "lb"),
            )
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = ItemStore::open_in_memory().unwrap();

        let first = store.insert(&prepared("Wings", "Chicken")).unwrap();
        let second = store.insert(&prepared("Chops", "Pork")).unwrap();

        assert!(first.is_saved());
        assert!(second.id() > first.id());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_get_roundtrips_every_field() {
        let store = ItemStore::open_in_memory().unwrap();
        let mut item = prepared("Wings", "Chicken");
        item.notes = Some("Buffalo style".to_string());

        let stored = store.insert(&item).unwrap();
        let loaded = store.get(stored.id()).unwrap();

        assert_eq!(loaded, stored);
        assert_eq!(loaded.expiration, Expiry::Known(date(2024, 10, 11)));
        assert_eq!(loaded.tags.join(","), "Raw,Meat");
    }

    #[test]
    fn test_unknown_dates_stay_unknown() {
        let store = ItemStore::open_in_memory().unwrap();
        let item = InventoryItem::new("Ice", "Other", 1, 90);

        let stored = store.insert(&item).unwrap();
        let loaded = store.get(stored.id()).unwrap();
        assert_eq!(loaded.date_frozen, None);
        assert_eq!(loaded.expiration, Expiry::Unknown);
        assert!(loaded.tags.is_empty());
    }

    #[test]
    fn test_update_replaces_record() {
        let store = ItemStore::open_in_memory().unwrap();
        let mut stored = store.insert(&prepared("Wings", "Chicken")).unwrap();

        stored.quantity = 5;
        stored.expiration = Expiry::Unknown;
        stored.tags = ["Cooked"].into_iter().collect();
        store.update(&stored).unwrap();

        assert_eq!(store.get(stored.id()).unwrap(), stored);
    }

    #[test]
    fn test_update_missing_item_is_not_found() {
        let store = ItemStore::open_in_memory().unwrap();
        let ghost = prepared("Ghost", "Other").with_id(99);

        assert!(matches!(store.update(&ghost), Err(StoreError::NotFound(99))));
        assert!(matches!(store.update_notes(99, Some("x")), Err(StoreError::NotFound(99))));
        assert!(matches!(store.delete(99), Err(StoreError::NotFound(99))));
        assert!(matches!(store.get(99), Err(StoreError::NotFound(99))));
    }

    #[test]
    fn test_update_notes_only() {
        let store = ItemStore::open_in_memory().unwrap();
        let stored = store.insert(&prepared("Wings", "Chicken")).unwrap();

        store.update_notes(stored.id(), Some("Use first")).unwrap();
        let loaded = store.get(stored.id()).unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("Use first"));
        assert_eq!(loaded.quantity, stored.quantity);

        store.update_notes(stored.id(), None).unwrap();
        assert_eq!(store.get(stored.id()).unwrap().notes, None);
    }

    #[test]
    fn test_insert_all_and_delete_many() {
        let mut store = ItemStore::open_in_memory().unwrap();
        let stored = store
            .insert_all(&[
                prepared("Wings", "Chicken"),
                prepared("Steak", "Beef"),
                prepared("Brisket", "Beef"),
            ])
            .unwrap();
        assert_eq!(stored.len(), 3);

        let removed = store.delete_many(&[stored[0].id(), stored[2].id(), 12345]).unwrap();
        assert_eq!(removed, 2);

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Steak");
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = ItemStore::open_in_memory().unwrap();
        for name in ["c", "a", "b"] {
            store.insert(&prepared(name, "Other")).unwrap();
        }

        let names: Vec<_> = store.list().unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_category_queries() {
        let store = ItemStore::open_in_memory().unwrap();
        store.insert(&prepared("Steak", "Beef")).unwrap();
        store.insert(&prepared("Wings", "Chicken")).unwrap();
        store.insert(&prepared("Brisket", "Beef")).unwrap();

        assert_eq!(store.categories().unwrap(), vec!["Beef", "Chicken"]);
        assert_eq!(store.count_by_category("Beef").unwrap(), 2);
        assert_eq!(store.count_by_category("beef").unwrap(), 0);

        let beef: Vec<_> = store
            .list_by_category("Beef")
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(beef, vec!["Steak", "Brisket"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("inventory.db");

        let id = {
            let store = ItemStore::open(&path).unwrap();
            store.insert(&prepared("Wings", "Chicken")).unwrap().id()
        };

        let store = ItemStore::open(&path).unwrap();
        assert_eq!(store.get(id).unwrap().name, "Wings");
    }
}
