//! Full load → enrich → metrics run, and the session cache around it

use crate::config::{DataSources, MetricRules};
use crate::enrich::{add_metrics, enrich, Lookups};
use crate::error::Result;
use crate::source::load_csv;
use crate::table::Table;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Load every part of the primary export and stack them in order.
/// Duplicate records across parts are kept.
pub fn load_primary(paths: &[PathBuf]) -> Result<Table> {
    let parts = paths
        .par_iter()
        .map(|p| load_csv(p))
        .collect::<Result<Vec<Table>>>()?;
    let table = Table::concat(parts);
    log::info!("Primary export: {} parts, {} rows", paths.len(), table.len());
    Ok(table)
}

pub fn load_lookups(sources: &DataSources) -> Result<Lookups> {
    Ok(Lookups {
        contact_types: load_csv(&sources.contact_types)?,
        products: load_csv(&sources.products)?,
        stage_order: load_csv(&sources.stage_order)?,
        calendar: load_csv(&sources.calendar)?,
    })
}

/// Build the enriched table every view works from
pub fn load_all(sources: &DataSources, rules: &MetricRules) -> Result<Table> {
    let primary = load_primary(&sources.primary)?;
    let lookups = load_lookups(sources)?;
    let mut table = enrich(&primary, &lookups)?;
    add_metrics(&mut table, rules)?;
    Ok(table)
}

/// Size and modification time of one input, `None` when unreadable
type Stamp = Option<(u64, SystemTime)>;

fn stamp(path: &Path) -> Stamp {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.len(), meta.modified().ok()?))
}

/// Identifies one pipeline result: inputs, their stamps and the rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    sources: DataSources,
    rules: MetricRules,
    stamps: Vec<Stamp>,
}

impl CacheKey {
    pub fn capture(sources: &DataSources, rules: &MetricRules) -> Self {
        Self {
            sources: sources.clone(),
            rules: rules.clone(),
            stamps: sources.all_paths().into_iter().map(stamp).collect(),
        }
    }
}

/// Read-through cache for `load_all`.
///
/// Holds the last successful result and reuses it until any input path,
/// size or modification time (or the metric rules) change. Failed loads
/// are not cached.
#[derive(Debug, Default)]
pub struct PanelCache {
    entry: Option<(CacheKey, Arc<Table>)>,
    loads: usize,
}

impl PanelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, sources: &DataSources, rules: &MetricRules) -> Result<Arc<Table>> {
        let key = CacheKey::capture(sources, rules);
        if let Some((cached_key, table)) = &self.entry {
            if *cached_key == key {
                log::debug!("Reusing cached gestiones table");
                return Ok(Arc::clone(table));
            }
            log::info!("Inputs changed, reloading");
        }

        let table = Arc::new(load_all(sources, rules)?);
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Number of full pipeline runs performed so far
    pub fn loads(&self) -> usize {
        self.loads
    }
}
