//! Per-item insert pipeline
//!
//! Construction resolves the target table once through the driver; after
//! that each `process_item` call runs
//! `before_insert -> get_document -> insert -> after_insert`.

use crate::connection::ConnectionFactory;
use crate::driver::Driver;
use crate::errors::{PipelineError, Result};
use crate::hooks::{DefaultHooks, InsertHooks};
use crate::item::{CrawlContext, Scraped};
use crate::settings::{PipelineSettings, SettingsSource};
use crate::statement::{InsertOptions, Table};
use rdbpipe_core_types::schema::EVENT_SKIPPED;
use std::sync::Arc;

/// Inserts one document per scraped item into a fixed table
pub struct InsertPipeline<F: ConnectionFactory, H: InsertHooks = DefaultHooks> {
    driver: Arc<Driver<F>>,
    table: Table,
    insert_options: InsertOptions,
    hooks: H,
}

impl<F: ConnectionFactory> InsertPipeline<F, DefaultHooks> {
    /// Start building a pipeline with default hooks
    pub fn builder() -> InsertPipelineBuilder<F, DefaultHooks> {
        InsertPipelineBuilder::new()
    }

    /// Primary constructor with default hooks
    ///
    /// # Errors
    ///
    /// See [`InsertPipelineBuilder::build`].
    pub fn new(
        driver: Arc<Driver<F>>,
        table_name: impl Into<String>,
        insert_options: InsertOptions,
    ) -> Result<Self> {
        Self::builder()
            .driver(driver)
            .table(table_name)
            .insert_options(insert_options)
            .build()
    }

    /// Build from the caller runtime's settings with default hooks
    ///
    /// # Errors
    ///
    /// See [`InsertPipeline::from_settings_with_hooks`].
    pub fn from_settings<S: SettingsSource + ?Sized>(source: &S, factory: F) -> Result<Self> {
        Self::from_settings_with_hooks(source, factory, DefaultHooks)
    }
}

impl<F: ConnectionFactory, H: InsertHooks> InsertPipeline<F, H> {
    /// Build from the caller runtime's settings
    ///
    /// Reads `table`, `connection` and `insert_options`, creates a driver
    /// from `connection`, then delegates to [`InsertPipelineBuilder::build`].
    /// A `NotConfigured` error means the caller should disable the stage.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: `connection` is not a mapping, `table` is not a
    ///   string, or `insert_options` is not a mapping of known options
    /// - `NotConfigured` / `TableNotFound`: as for `build`
    pub fn from_settings_with_hooks<S: SettingsSource + ?Sized>(
        source: &S,
        factory: F,
        hooks: H,
    ) -> Result<Self> {
        let settings = PipelineSettings::extract(source)?;
        let driver = Driver::from_value(factory, settings.connection)?;
        let insert_options = settings
            .insert_options
            .map(InsertOptions::from_value)
            .transpose()?;

        let mut builder = InsertPipelineBuilder::new()
            .driver(Arc::new(driver))
            .hooks(hooks);
        if let Some(table) = settings.table {
            builder = builder.table(table);
        }
        if let Some(options) = insert_options {
            builder = builder.insert_options(options);
        }
        builder.build()
    }

    pub fn driver(&self) -> &Arc<Driver<F>> {
        &self.driver
    }

    /// The table resolved at construction
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn insert_options(&self) -> &InsertOptions {
        &self.insert_options
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Persist one scraped value
    ///
    /// Non-items are returned unchanged after a single warning. Items go
    /// through the hooks and exactly one insert, then are returned
    /// (possibly mutated by the hooks).
    ///
    /// # Errors
    ///
    /// Hook and execution failures, unchanged. Nothing is retried.
    pub fn process_item(&self, scraped: Scraped, ctx: &CrawlContext) -> Result<Scraped> {
        let mut item = match scraped {
            Scraped::Item(item) => item,
            Scraped::Other(value) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "process_item",
                    event = EVENT_SKIPPED,
                    source = ctx.source.as_str(),
                    request_id = ctx.request_id.as_str(),
                    table = self.table.name(),
                    "Item not valid for insert pipeline <{}>. Ignoring item.",
                    value
                );
                return Ok(Scraped::Other(value));
            }
        };

        self.hooks.before_insert(&mut item)?;
        let document = self.hooks.get_document(&item)?;
        let statement = self.table.insert(document, &self.insert_options);
        let insert_result = self.driver.execute(&statement)?;
        self.hooks.after_insert(&mut item, &insert_result)?;

        Ok(Scraped::Item(item))
    }
}

/// Collects the three required inputs and validates them in order
pub struct InsertPipelineBuilder<F: ConnectionFactory, H: InsertHooks = DefaultHooks> {
    driver: Option<Arc<Driver<F>>>,
    table_name: Option<String>,
    insert_options: Option<InsertOptions>,
    hooks: H,
}

impl<F: ConnectionFactory> InsertPipelineBuilder<F, DefaultHooks> {
    pub fn new() -> Self {
        Self {
            driver: None,
            table_name: None,
            insert_options: None,
            hooks: DefaultHooks,
        }
    }
}

impl<F: ConnectionFactory> Default for InsertPipelineBuilder<F, DefaultHooks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ConnectionFactory, H: InsertHooks> InsertPipelineBuilder<F, H> {
    pub fn driver(mut self, driver: Arc<Driver<F>>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn insert_options(mut self, insert_options: InsertOptions) -> Self {
        self.insert_options = Some(insert_options);
        self
    }

    /// Replace the hooks
    pub fn hooks<H2: InsertHooks>(self, hooks: H2) -> InsertPipelineBuilder<F, H2> {
        InsertPipelineBuilder {
            driver: self.driver,
            table_name: self.table_name,
            insert_options: self.insert_options,
            hooks,
        }
    }

    /// Validate inputs and resolve the table
    ///
    /// Checks run in a fixed order: driver, table name, table resolution,
    /// insert options. A missing table therefore fails before missing
    /// insert options are noticed.
    ///
    /// # Errors
    ///
    /// - `NotConfigured`: driver missing, table name missing or empty,
    ///   insert options missing
    /// - `TableNotFound`: the table does not exist
    /// - any connection or execution error from the table lookup
    pub fn build(self) -> Result<InsertPipeline<F, H>> {
        let driver = self.driver.ok_or(PipelineError::DriverNotProvided)?;

        let table_name = self
            .table_name
            .filter(|name| !name.is_empty())
            .ok_or(PipelineError::TableNameNotProvided)?;
        let table = driver.get_table(&table_name)?;

        let insert_options = self
            .insert_options
            .ok_or(PipelineError::InsertOptionsNotProvided)?;

        Ok(InsertPipeline {
            driver,
            table,
            insert_options,
            hooks: self.hooks,
        })
    }
}
