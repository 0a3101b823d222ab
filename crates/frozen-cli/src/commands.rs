use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use frozen_core::category::COMMON_TAGS;
use frozen_core::expiration::countdown_text;
use frozen_core::{
    Clock, Config, ExpirationCalculator, ExpirationStatus, ExportFormat, Exporter, FixedClock,
    Importer, InventoryItem, InventorySummary, ItemQuery, NewItem, SortOrder, SystemClock, Tags,
};
use frozen_store::ItemStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", raw, e))
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,

    #[arg(short, long)]
    pub category: String,

    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,

    /// Date it went into the freezer (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub frozen: Option<NaiveDate>,

    /// Explicit expiration date instead of the category's shelf-life
    #[arg(long, value_parser = parse_date)]
    pub expires: Option<NaiveDate>,

    /// Shelf-life in days for this item
    #[arg(long)]
    pub max_days: Option<u32>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long)]
    pub weight: Option<String>,

    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long)]
    pub category: Option<String>,

    /// Case-insensitive match on name or category
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only items expiring within the horizon
    #[arg(long)]
    pub expiring: bool,

    /// Horizon in days for --expiring
    #[arg(long, requires = "expiring")]
    pub horizon: Option<u32>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

/// Fields left out keep their stored value
#[derive(Args)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub quantity: Option<u32>,

    #[arg(long, value_parser = parse_date)]
    pub frozen: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date)]
    pub expires: Option<NaiveDate>,

    #[arg(long)]
    pub max_days: Option<u32>,

    /// Replaces all tags when given
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,

    /// Remove a single tag, keeping the rest
    #[arg(long = "untag", conflicts_with = "clear_tags")]
    pub untag: Vec<String>,

    #[arg(long)]
    pub weight: Option<String>,

    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Ascending,
            SortArg::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
    #[value(alias = "md")]
    Markdown,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Markdown => ExportFormat::Markdown,
        }
    }
}

/// Everything a command needs, wired up once per run
pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    store: ItemStore,
    calculator: ExpirationCalculator,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(
        config_path: Option<&Path>,
        db_path: Option<PathBuf>,
        today: Option<NaiveDate>,
        durations: &[(String, i64)],
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load().context("Failed to load config")?,
        };

        let table = config.duration_table();
        for (category, days) in durations {
            table
                .set_duration(category, *days)
                .with_context(|| format!("Invalid --duration for {}", category))?;
        }

        let thresholds = config.expiration.thresholds()?;
        let calculator = ExpirationCalculator::new(Arc::new(table)).with_thresholds(thresholds);

        let clock: Box<dyn Clock> = match today {
            Some(date) => {
                debug!("Clock pinned to {}", date);
                Box::new(FixedClock::on(date))
            }
            None => Box::new(SystemClock),
        };

        let db_path = match db_path {
            Some(path) => path,
            None => config.store.resolved_db_path()?,
        };
        let store = ItemStore::open(&db_path)
            .with_context(|| format!("Failed to open inventory at {}", db_path.display()))?;

        let app = Self::from_parts(config, store, calculator, clock);
        Ok(match config_path {
            Some(path) => app.with_config_path(path),
            None => app,
        })
    }

    pub fn from_parts(
        config: Config,
        store: ItemStore,
        calculator: ExpirationCalculator,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config,
            config_path: None,
            store,
            calculator,
            clock,
        }
    }

    /// Save config changes here instead of the default location
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn add(&mut self, args: AddArgs) -> Result<()> {
        let today = self.clock.today();
        let new = NewItem {
            name: args.name,
            category: args.category,
            quantity: args.quantity,
            date_frozen: Some(args.frozen.unwrap_or(today)),
            expiration_date: args.expires,
            max_freeze_days: args.max_days,
            tags: args.tags.into_iter().collect(),
            weight: args.weight,
            weight_unit: args.unit,
            notes: args.notes,
        };

        let item = self.calculator.prepare(new)?;
        let saved = self.store.insert(&item)?;
        info!("Added item {} ({})", saved.id(), saved.name);

        println!("Added #{}", saved.id());
        println!("{}", self.render_row(&saved, today));
        Ok(())
    }

    pub fn list(&mut self, args: ListArgs) -> Result<()> {
        let today = self.clock.today();
        let items = self.store.list()?;

        let mut query = ItemQuery::new().order(
            args.sort
                .map(SortOrder::from)
                .unwrap_or(self.config.display.default_sort),
        );
        if let Some(category) = args.category {
            query = query.category(category);
        }
        if let Some(search) = args.search {
            query = query.search(search);
        }
        if args.expiring {
            query = query.near_expiration(
                args.horizon
                    .unwrap_or(self.config.expiration.near_expiration_days),
            );
        }

        let selected = query.apply(&items, today);
        if selected.is_empty() {
            println!("Nothing in the freezer matches.");
            return Ok(());
        }

        for item in &selected {
            println!("{}", self.render_row(item, today));
        }
        println!();
        println!("{} of {} items", selected.len(), items.len());
        Ok(())
    }

    pub fn show(&mut self, id: i64) -> Result<()> {
        let today = self.clock.today();
        let item = self
            .store
            .get(id)
            .with_context(|| format!("No item #{}", id))?;

        let days = self.calculator.days_until_expiration(item.expiration, today);
        let status = self.calculator.item_status(&item, today);

        println!("#{} {}", item.id(), item.name);
        println!("  Category:    {}", item.category);
        println!("  Quantity:    {}", item.quantity);
        println!(
            "  Frozen:      {}",
            item.date_frozen
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Unknown".to_string())
        );
        println!("  Expires:     {}", item.expiration);
        println!(
            "  Status:      {} {} ({})",
            status.emoji(),
            status.label(),
            status.color_code()
        );
        println!("  Countdown:   {}", countdown_text(days));
        println!("  Shelf-life:  {} days", item.max_freeze_days);
        if !item.tags.is_empty() {
            println!("  Tags:        {}", item.tags.join(", "));
        }
        if let Some(weight) = item.formatted_weight() {
            println!("  Weight:      {}", weight);
        }
        if let Some(notes) = &item.notes {
            println!("  Notes:       {}", notes);
        }
        Ok(())
    }

    pub fn update(&mut self, args: UpdateArgs) -> Result<()> {
        let existing = self
            .store
            .get(args.id)
            .with_context(|| format!("No item #{}", args.id))?;
        let mut new = NewItem::from(existing.clone());

        let category_changed = args.category.is_some();
        let reschedule = args.frozen.is_some() || args.max_days.is_some() || category_changed;

        if let Some(name) = args.name {
            new.name = name;
        }
        if let Some(category) = args.category {
            new.category = category;
        }
        if let Some(quantity) = args.quantity {
            new.quantity = quantity;
        }
        if let Some(frozen) = args.frozen {
            new.date_frozen = Some(frozen);
        }
        match args.max_days {
            Some(days) => new.max_freeze_days = Some(days),
            // a new category brings its own shelf-life
            None if category_changed => new.max_freeze_days = None,
            None => {}
        }
        match args.expires {
            Some(date) => new.expiration_date = Some(date),
            None if reschedule => new.expiration_date = None,
            None => {}
        }
        if args.clear_tags {
            new.tags = Tags::new();
        } else if !args.tags.is_empty() {
            new.tags = args.tags.into_iter().collect();
        }
        for tag in &args.untag {
            if !new.tags.remove(tag) {
                warn!("Item #{} has no tag '{}'", existing.id(), tag);
            }
        }
        if args.weight.is_some() {
            new.weight = args.weight;
        }
        if args.unit.is_some() {
            new.weight_unit = args.unit;
        }
        if args.notes.is_some() {
            new.notes = args.notes;
        }

        let item = self.calculator.prepare_update(&existing, new)?;
        self.store.update(&item)?;
        info!("Updated item {}", item.id());

        println!("{}", self.render_row(&item, self.clock.today()));
        Ok(())
    }

    pub fn notes(&mut self, id: i64, text: Option<String>) -> Result<()> {
        let text = text.filter(|t| !t.trim().is_empty());
        self.store
            .update_notes(id, text.as_deref())
            .with_context(|| format!("No item #{}", id))?;

        match text {
            Some(_) => println!("Notes saved for #{}", id),
            None => println!("Notes cleared for #{}", id),
        }
        Ok(())
    }

    pub fn delete(&mut self, ids: &[i64]) -> Result<()> {
        let removed = if let [id] = ids {
            self.store
                .delete(*id)
                .with_context(|| format!("No item #{}", id))?;
            1
        } else {
            self.store.delete_many(ids)?
        };

        if removed < ids.len() {
            warn!("{} of the given ids did not exist", ids.len() - removed);
        }
        println!("Deleted {} item(s)", removed);
        Ok(())
    }

    pub fn categories(&mut self) -> Result<()> {
        let durations = self.calculator.durations();
        let mut rows = durations.entries();

        // categories only known from stored items use the default shelf-life
        for category in self.store.categories()? {
            if !rows.iter().any(|(name, _)| *name == category) {
                let days = durations.duration_days(&category);
                rows.push((category, days));
            }
        }

        for (category, days) in rows {
            let count = self.store.count_by_category(&category)?;
            println!("{:<16} {:>4} days  {:>3} items", category, days, count);
        }

        println!();
        println!("Suggested tags: {}", COMMON_TAGS.join(", "));
        Ok(())
    }

    /// Persist a shelf-life override to the config file
    pub fn save_duration(&mut self, category: &str, days: i64) -> Result<()> {
        let category = category.trim();
        self.calculator
            .durations()
            .set_duration(category, days)
            .with_context(|| format!("Invalid duration for {}", category))?;
        self.config
            .categories
            .durations
            .insert(category.to_string(), days);

        let saved = match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        };
        saved.context("Failed to save config")?;

        info!("Saved {} day shelf-life for {}", days, category);
        println!("{} items now keep for {} days", category, days);
        Ok(())
    }

    pub fn status(&mut self) -> Result<()> {
        let today = self.clock.today();
        let items = self.store.list()?;
        let summary = InventorySummary::from_items(&items, &self.calculator, today);

        println!(
            "{} items ({} pieces) as of {}",
            summary.total_items, summary.total_quantity, today
        );
        for status in ExpirationStatus::all() {
            println!(
                "  {} {:<9} {}",
                status.emoji(),
                status.label(),
                summary.count(status)
            );
        }
        if summary.needs_attention() > 0 {
            println!();
            println!("{} item(s) need attention", summary.needs_attention());
        }
        Ok(())
    }

    pub fn export(&mut self, path: &Path, format: Option<FormatArg>) -> Result<()> {
        let today = self.clock.today();
        let items = self.store.list()?;

        let written = match format {
            Some(format) => Exporter::export_to_file_with_format(
                &items,
                path,
                format.into(),
                &self.calculator,
                today,
            ),
            None => Exporter::export_to_file(&items, path, &self.calculator, today),
        };
        written.with_context(|| format!("Failed to export to {}", path.display()))?;

        println!("Exported {} items to {}", items.len(), path.display());
        Ok(())
    }

    pub fn import(&mut self, path: &Path, format: Option<FormatArg>, yes: bool) -> Result<()> {
        let incoming = match format {
            Some(format) => Importer::import_from_file_with_format(path, format.into()),
            None => Importer::import_from_file(path),
        }
        .with_context(|| format!("Failed to read {}", path.display()))?;

        let total = incoming.len();
        let mut items = Vec::with_capacity(total);
        for new in incoming {
            let name = new.name.clone();
            match self.calculator.prepare(new) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping '{}': {}", name, e),
            }
        }

        if !yes {
            println!(
                "{} of {} items in {} can be imported. Re-run with --yes to add them.",
                items.len(),
                total,
                path.display()
            );
            return Ok(());
        }

        let saved = self.store.insert_all(&items)?;
        println!("Imported {} items", saved.len());
        Ok(())
    }

    fn render_row(&self, item: &InventoryItem, today: NaiveDate) -> String {
        let days = self.calculator.days_until_expiration(item.expiration, today);
        let status = self.calculator.status_bucket(days);
        format!(
            "{:>4}  {} {:<24} {:<14} x{:<3} {:<10}  {}",
            item.id(),
            status.emoji(),
            item.name,
            item.category,
            item.quantity,
            item.expiration.to_string(),
            countdown_text(days)
        )
    }

    #[cfg(test)]
    fn store(&self) -> &ItemStore {
        &self.store
    }
}
