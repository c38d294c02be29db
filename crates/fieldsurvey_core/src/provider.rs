//! Survey data-access surface: routed query, insert, update and delete.
//!
//! # Responsibility
//! - Resolve caller URIs into query plans and run them under one lock.
//! - Keep derived rows (surveys, prompts, prompt responses) in step with
//!   the campaign or response that owns them.
//! - Clean up cached campaign icons once no campaign references them.
//! - Publish change notifications for every successful mutation.
//!
//! # Invariants
//! - Every entry point holds the connection lock for its whole database
//!   work, so no caller observes a half-applied cascade.
//! - Each mutation commits as one transaction; a failure rolls back every
//!   row it touched, derived rows included.
//! - Notifications are published only after commit and after the lock is
//!   released, and only when at least one row changed.
//! - Icon cleanup never fails the delete that triggered it.

use crate::cache::{DisabledIconCache, FileIconCache, IconCache};
use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::error::{StoreError, StoreResult};
use crate::logging::{default_log_level, init_logging};
use crate::model::FromRow;
use crate::notify::{ChangeNotifier, ChangeObserver};
use crate::query::{ContentValues, RowSet, SelectionBuilder};
use crate::repo::campaign_repo::{CampaignRepository, SqliteCampaignRepository};
use crate::repo::response_repo::{ResponseRepository, SqliteResponseRepository};
use crate::resolver::{resolve, Access};
use crate::route::{EntityKind, ResourceType, Route};
use crate::schema::{campaigns, Table};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Routed access to the five survey tables.
pub struct SurveyStore {
    conn: Mutex<Connection>,
    notifier: Arc<ChangeNotifier>,
    icons: Arc<dyn IconCache>,
}

impl SurveyStore {
    /// Wraps an already migrated connection with a private notifier and no
    /// icon cache.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            notifier: Arc::new(ChangeNotifier::new()),
            icons: Arc::new(DisabledIconCache),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_icon_cache(mut self, icons: Arc<dyn IconCache>) -> Self {
        self.icons = icons;
        self
    }

    /// Opens a store as described by `config`, starting file logging first
    /// when `log_dir` is set.
    ///
    /// # Errors
    /// - `Config` when logging cannot start.
    /// - `Db` when the database cannot be opened or migrated.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        if let Some(log_dir) = config.log_dir.as_deref() {
            let level = config.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir)?;
        }

        let conn = match config.database_path.as_deref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        let mut store = Self::new(conn);
        if let Some(dir) = config.icon_cache_dir.as_deref() {
            store = store.with_icon_cache(Arc::new(FileIconCache::new(dir)));
        }
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// Entity kind and cardinality served by `uri`.
    pub fn resource_type(&self, uri: &str) -> StoreResult<ResourceType> {
        Ok(Route::parse(uri)?.resource_type())
    }

    /// Registers `observer` for changes published on `uri`.
    ///
    /// The URI is normalized to its canonical form first, so `/responses/`
    /// and `responses` name the same registration.
    pub fn subscribe(&self, uri: &str, observer: &Arc<dyn ChangeObserver>) -> StoreResult<()> {
        let route = Route::parse(uri)?;
        self.notifier.subscribe(&route.to_string(), observer);
        Ok(())
    }

    pub fn unsubscribe(&self, uri: &str, observer: &Arc<dyn ChangeObserver>) -> StoreResult<()> {
        let route = Route::parse(uri)?;
        self.notifier.unsubscribe(&route.to_string(), observer);
        Ok(())
    }

    /// Reads the rows addressed by `uri`.
    ///
    /// `filter` and `args` narrow the route's own scope; they can never widen
    /// it. `projection` and `sort_order` accept plain column names only.
    ///
    /// Read plans join related tables, so a filter naming a column that more
    /// than one of them carries (`campaign_urn`, `survey_id`, `prompt_id`) must
    /// qualify it, as in `responses.survey_id = ?`.
    pub fn query(
        &self,
        uri: &str,
        projection: Option<&[&str]>,
        filter: Option<&str>,
        args: &[Value],
        sort_order: Option<&str>,
    ) -> StoreResult<RowSet> {
        let started_at = Instant::now();
        let result = Route::parse(uri).and_then(|route| {
            let plan = resolve(&route, Access::Read)?.filter(filter, args)?;
            let conn = self.lock()?;
            plan.query(&conn, projection, sort_order)
        });

        match &result {
            Ok(rows) => debug!(
                "event=store_query module=provider status=ok route={} rows={} duration_ms={}",
                uri,
                rows.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_query", uri, started_at, err),
        }
        result
    }

    /// Reads `uri` and decodes every row as `T`.
    pub fn query_as<T: FromRow>(
        &self,
        uri: &str,
        filter: Option<&str>,
        args: &[Value],
        sort_order: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        let rows = self.query(uri, None, filter, args, sort_order)?;
        rows.rows().map(|row| T::from_row(&row)).collect()
    }

    /// Inserts one campaign (`campaigns`) or response (`responses`) and
    /// returns its canonical URI.
    ///
    /// # Errors
    /// - `UnsupportedOperation` for any other route.
    /// - `MissingValue` when the owning keys are absent.
    /// - `InvalidDocument` when the configuration or payload cannot be
    ///   parsed; nothing is stored in that case.
    pub fn insert(&self, uri: &str, values: &ContentValues) -> StoreResult<String> {
        let started_at = Instant::now();
        let result = Route::parse(uri).and_then(|route| {
            let created = self.insert_locked(&route, values)?;
            self.publish_changes(&route);
            Ok(created.to_string())
        });

        match &result {
            Ok(created) => info!(
                "event=store_insert module=provider status=ok route={} created={} duration_ms={}",
                uri,
                created,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_insert", uri, started_at, err),
        }
        result
    }

    /// Applies `values` to every row addressed by `uri` and the optional
    /// filter. Returns the number of rows changed; `0` means nothing matched.
    ///
    /// Updating a campaign with both `campaign_urn` and
    /// `campaign_configuration_xml` re-derives its surveys and prompts.
    pub fn update(
        &self,
        uri: &str,
        values: &ContentValues,
        filter: Option<&str>,
        args: &[Value],
    ) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = Route::parse(uri).and_then(|route| {
            let plan = resolve(&route, Access::Mutation)?.filter(filter, args)?;
            let count = self.update_locked(&route, &plan, values)?;
            if count > 0 {
                self.publish_changes(&route);
            }
            Ok(count)
        });

        match &result {
            Ok(count) => info!(
                "event=store_update module=provider status=ok route={} count={} duration_ms={}",
                uri,
                count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_update", uri, started_at, err),
        }
        result
    }

    /// Deletes every row addressed by `uri` and the optional filter.
    ///
    /// Dependent rows go with their parent. The returned count covers the
    /// addressed table only; repeating a delete returns `0`.
    pub fn delete(&self, uri: &str, filter: Option<&str>, args: &[Value]) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = Route::parse(uri).and_then(|route| {
            let plan = resolve(&route, Access::Mutation)?.filter(filter, args)?;
            let count = self.delete_locked(&route, &plan)?;
            if count > 0 {
                self.publish_changes(&route);
            }
            Ok(count)
        });

        match &result {
            Ok(count) => info!(
                "event=store_delete module=provider status=ok route={} count={} duration_ms={}",
                uri,
                count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_delete", uri, started_at, err),
        }
        result
    }

    /// Removes every row of every table and evicts all cached icons.
    /// Returns the total number of rows removed.
    pub fn clear_all(&self) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = self.clear_locked();
        match &result {
            Ok(count) => {
                if *count > 0 {
                    for entity in EntityKind::ALL {
                        self.notifier.publish(entity.collection_uri());
                    }
                }
                info!(
                    "event=store_clear module=provider status=ok count={} duration_ms={}",
                    count,
                    started_at.elapsed().as_millis()
                );
            }
            Err(err) => log_failure("store_clear", "*", started_at, err),
        }
        result
    }

    /// Runs `f` against the connection under the store lock.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn insert_locked(&self, route: &Route, values: &ContentValues) -> StoreResult<Route> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let created = match route {
            Route::Campaigns => {
                let urn = values
                    .get_text(campaigns::URN.name())
                    .ok_or(StoreError::MissingValue("campaign_urn"))?
                    .to_string();
                SqliteCampaignRepository::new(&tx).insert_campaign(values)?;
                Route::CampaignByUrn { urn }
            }
            Route::Responses => {
                let id = SqliteResponseRepository::new(&tx).insert_response(values)?;
                Route::ResponseById { id }
            }
            _ => {
                return Err(StoreError::UnsupportedOperation {
                    operation: "insert",
                    target: route.to_string(),
                })
            }
        };
        tx.commit()?;
        Ok(created)
    }

    fn update_locked(
        &self,
        route: &Route,
        plan: &SelectionBuilder,
        values: &ContentValues,
    ) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if route.entity() == EntityKind::Campaign {
            ensure_urn_kept(&tx, route, plan, values)?;
        }
        let count = plan.update(&tx, values)?;

        if count > 0 && route.entity() == EntityKind::Campaign {
            let urn = values.get_text(campaigns::URN.name());
            let document = values.get_text(campaigns::CONFIGURATION.name());
            if let (Some(urn), Some(document)) = (urn, document) {
                SqliteCampaignRepository::new(&tx).replace_surveys(urn, document)?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    fn delete_locked(&self, route: &Route, plan: &SelectionBuilder) -> StoreResult<usize> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let icons = if route.entity() == EntityKind::Campaign {
            referenced_icons(&plan.query(&tx, Some(&[campaigns::ICON.name()]), None)?)
        } else {
            BTreeSet::new()
        };
        let count = plan.delete(&tx)?;
        tx.commit()?;

        if count > 0 {
            for icon in &icons {
                self.release_icon(&mut conn, icon);
            }
        }
        Ok(count)
    }

    fn clear_locked(&self) -> StoreResult<usize> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let icons = referenced_icons(
            &SelectionBuilder::new()
                .table(Table::Campaigns)
                .query(&tx, Some(&[campaigns::ICON.name()]), None)?,
        );
        let mut count = 0;
        for table in Table::ALL.iter().rev() {
            count += tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
        }
        tx.commit()?;

        for icon in &icons {
            self.release_icon(&mut conn, icon);
        }
        Ok(count)
    }

    /// Evicts `icon` when no campaign references it anymore. Failures are
    /// logged and swallowed.
    fn release_icon(&self, conn: &mut Connection, icon: &str) {
        match self.try_release_icon(conn, icon) {
            Ok(evicted) => debug!(
                "event=icon_cleanup module=provider status=ok evicted={}",
                evicted
            ),
            Err(err) => warn!(
                "event=icon_cleanup module=provider status=error error_code={} error={}",
                err.code(),
                err
            ),
        }
    }

    fn try_release_icon(&self, conn: &mut Connection, icon: &str) -> StoreResult<bool> {
        let tx = conn.transaction()?;
        let remaining = SqliteCampaignRepository::new(&tx).icon_reference_count(icon)?;
        let evicted = if remaining > 0 {
            false
        } else {
            self.icons.evict(icon).unwrap_or_else(|err| {
                warn!(
                    "event=icon_cleanup module=provider status=error error_code=io error={}",
                    err
                );
                false
            })
        };
        tx.commit()?;
        Ok(evicted)
    }

    /// Publishes on every collection affected by `route` and on the route
    /// itself, each URI once.
    fn publish_changes(&self, route: &Route) {
        let mut uris: Vec<String> = route
            .entity()
            .affected_collections()
            .iter()
            .map(|entity| entity.collection_uri().to_string())
            .collect();
        let own = route.to_string();
        if !uris.contains(&own) {
            uris.push(own);
        }
        for uri in &uris {
            self.notifier.publish(uri);
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Surveys and responses key on `campaign_urn`, so an update may restate a
/// campaign's urn but never change it.
fn ensure_urn_kept(
    conn: &Connection,
    route: &Route,
    plan: &SelectionBuilder,
    values: &ContentValues,
) -> StoreResult<()> {
    let Some(urn) = values.get_text(campaigns::URN.name()) else {
        return Ok(());
    };
    let current = plan.query(conn, Some(&[campaigns::URN.name()]), None)?;
    let renamed = current
        .rows()
        .any(|row| row.get_text(campaigns::URN.name()) != Some(urn));
    if renamed {
        return Err(StoreError::UnsupportedOperation {
            operation: "campaign_urn change",
            target: route.to_string(),
        });
    }
    Ok(())
}

fn referenced_icons(rows: &RowSet) -> BTreeSet<String> {
    rows.rows()
        .filter_map(|row| row.get_text(campaigns::ICON.name()).map(str::to_string))
        .collect()
}

fn log_failure(event: &str, uri: &str, started_at: Instant, err: &StoreError) {
    error!(
        "event={} module=provider status=error route={} duration_ms={} error_code={} error={}",
        event,
        uri,
        started_at.elapsed().as_millis(),
        err.code(),
        crate::logging::sanitize_message(&err.to_string(), 200)
    );
}
