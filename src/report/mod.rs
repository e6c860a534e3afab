//! The three dashboard views built from the enriched table
//!
//! Each view applies its own [`FilterSet`] to the shared table and then
//! aggregates the surviving rows. An empty selection is reported as
//! [`PanelError::EmptySelection`](crate::error::PanelError::EmptySelection)
//! so callers can show a warning instead of empty charts.

pub mod aggregate;
pub mod filter;
pub mod render;

pub use aggregate::{
    agent_day_comparison, agent_summary, detail_rows, first_gestion_by_agent,
    gestiones_by_type_and_day, hour_crosstab, kpis, percent_directo, value_counts, AgentSummary,
    CrossTab, DayComparison, FirstGestion, Kpis, TypeDayCount, ValueCount, UNDEFINED_LABEL,
};
pub use filter::{filter_options, hour_bounds, require_rows, Choice, Dimension, FilterSet, HourRange};

use crate::columns::*;
use crate::error::Result;
use crate::table::Table;

/// Operational overview: KPIs, funnel, agent performance
#[derive(Debug, Clone)]
pub struct Overview {
    pub filters: FilterSet,
    pub rows: usize,
    pub kpis: Kpis,
    pub first_gestion: Vec<FirstGestion>,
    pub contact_types: Vec<ValueCount>,
    pub agents: Vec<AgentSummary>,
    pub crosstab: CrossTab,
}

pub fn overview(table: &Table, filters: &FilterSet) -> Result<Overview> {
    let subset = filters.apply(table)?;
    require_rows(&subset)?;
    log::debug!("Overview over {} rows ({})", subset.len(), filters);

    Ok(Overview {
        filters: filters.clone(),
        rows: subset.len(),
        kpis: kpis(&subset)?,
        first_gestion: first_gestion_by_agent(&subset)?,
        contact_types: value_counts(&subset, TIPO_CONTACTO)?,
        agents: agent_summary(&subset)?,
        crosstab: hour_crosstab(&subset)?,
    })
}

/// Record-level drill-down
#[derive(Debug, Clone)]
pub struct Detail {
    pub filters: FilterSet,
    pub responses: Vec<ValueCount>,
    pub contact_types: Vec<ValueCount>,
    pub rows: Table,
}

pub fn detail(table: &Table, filters: &FilterSet) -> Result<Detail> {
    let subset = filters.apply(table)?;
    require_rows(&subset)?;

    Ok(Detail {
        filters: filters.clone(),
        responses: value_counts(&subset, RESPUESTA)?,
        contact_types: value_counts(&subset, TIPO_CONTACTO)?,
        rows: detail_rows(&subset)?,
    })
}

/// Day-over-day comparison
#[derive(Debug, Clone)]
pub struct Comparison {
    pub filters: FilterSet,
    pub by_type: Vec<TypeDayCount>,
    pub by_agent: DayComparison,
}

/// Requires the calendar's `MesDia` column
pub fn comparison(table: &Table, filters: &FilterSet) -> Result<Comparison> {
    table.require_columns("gestiones", &[MES_DIA])?;
    let subset = filters.apply(table)?;
    require_rows(&subset)?;

    Ok(Comparison {
        filters: filters.clone(),
        by_type: gestiones_by_type_and_day(&subset)?,
        by_agent: agent_day_comparison(&subset)?,
    })
}
