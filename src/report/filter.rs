//! Per-view equality filters and the hour range

use crate::columns::*;
use crate::enrich::parse_hour;
use crate::error::{PanelError, Result};
use crate::table::Table;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A categorical filter the dashboard offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Fecha,
    Supervisor,
    Gestor,
    Etapa,
    Estrategia,
    Producto,
    Canal,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Fecha,
        Dimension::Supervisor,
        Dimension::Gestor,
        Dimension::Etapa,
        Dimension::Estrategia,
        Dimension::Producto,
        Dimension::Canal,
    ];

    /// Column the dimension filters on
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Fecha => FECHA_GESTION,
            Dimension::Supervisor => SUPERVISOR,
            Dimension::Gestor => GESTOR,
            Dimension::Etapa => ETAPA,
            Dimension::Estrategia => ESTRATEGIA,
            Dimension::Producto => PRODUCTO,
            Dimension::Canal => ROBOT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Fecha => "Fecha Gestión",
            Dimension::Supervisor => "Supervisor",
            Dimension::Gestor => "Gestor",
            Dimension::Etapa => "Etapa",
            Dimension::Estrategia => "Estrategia",
            Dimension::Producto => "Producto",
            Dimension::Canal => "Canal",
        }
    }

    /// Parse a dimension name as typed on the command line
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fecha" | "fechagestion" => Some(Dimension::Fecha),
            "supervisor" => Some(Dimension::Supervisor),
            "gestor" => Some(Dimension::Gestor),
            "etapa" => Some(Dimension::Etapa),
            "estrategia" => Some(Dimension::Estrategia),
            "producto" => Some(Dimension::Producto),
            "canal" | "robot" => Some(Dimension::Canal),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Selected value of one dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice {
    /// No filtering ("Todas")
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// `Todas`, `Todos`, `all` and blank select everything
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" | "todas" | "todos" | "all" => Choice::All,
            _ => Choice::Only(s.to_string()),
        }
    }

    pub fn matches(&self, cell: Option<&str>) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(value) => cell.map(str::trim) == Some(value.as_str()),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => write!(f, "Todas"),
            Choice::Only(v) => write!(f, "{}", v),
        }
    }
}

/// Inclusive hour-of-day range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    pub from: u32,
    pub to: u32,
}

impl HourRange {
    /// Reversed bounds are swapped
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            from: a.min(b),
            to: a.max(b),
        }
    }

    /// Parse `8-12`, or a single hour `9`
    pub fn parse(s: &str) -> Result<Self> {
        let bad = || PanelError::InvalidFilter(format!("hour range '{}'", s));
        let parse_one = |p: &str| p.trim().parse::<u32>().ok().filter(|h| *h < 24);
        match s.split_once('-') {
            Some((a, b)) => {
                let a = parse_one(a).ok_or_else(bad)?;
                let b = parse_one(b).ok_or_else(bad)?;
                Ok(HourRange::new(a, b))
            }
            None => {
                let h = parse_one(s).ok_or_else(bad)?;
                Ok(HourRange::new(h, h))
            }
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.from <= hour && hour <= self.to
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// The filters chosen for one view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    choices: BTreeMap<Dimension, Choice>,
    hours: Option<HourRange>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: Dimension, choice: Choice) -> Self {
        self.set(dimension, choice);
        self
    }

    pub fn with_hours(mut self, hours: HourRange) -> Self {
        self.hours = Some(hours);
        self
    }

    pub fn set(&mut self, dimension: Dimension, choice: Choice) {
        match choice {
            Choice::All => {
                self.choices.remove(&dimension);
            }
            only => {
                self.choices.insert(dimension, only);
            }
        }
    }

    pub fn set_hours(&mut self, hours: Option<HourRange>) {
        self.hours = hours;
    }

    pub fn hours(&self) -> Option<HourRange> {
        self.hours
    }

    pub fn choice(&self, dimension: Dimension) -> Choice {
        self.choices.get(&dimension).cloned().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.choices.clear();
        self.hours = None;
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.hours.is_none()
    }

    /// Rows satisfying every active filter. Rows without a readable hour
    /// are dropped while an hour range is set.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        let mut needed: Vec<&str> = self.choices.keys().map(|d| d.column()).collect();
        if self.hours.is_some() {
            needed.push(HORA);
        }
        table.require_columns("gestiones", &needed)?;

        let active: Vec<(usize, &Choice)> = self
            .choices
            .iter()
            .filter_map(|(d, c)| table.column_index(d.column()).map(|i| (i, c)))
            .collect();
        let hour_idx = table.column_index(HORA);

        Ok(table.filter_rows(|row| {
            let categorical = active.iter().all(|(i, c)| c.matches(row[*i].as_deref()));
            let in_range = match (self.hours, hour_idx) {
                (Some(range), Some(i)) => {
                    parse_hour(row[i].as_deref()).is_some_and(|h| range.contains(h))
                }
                _ => true,
            };
            categorical && in_range
        }))
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "sin filtros");
        }
        let mut parts: Vec<String> = self
            .choices
            .iter()
            .map(|(d, c)| format!("{}={}", d, c))
            .collect();
        if let Some(h) = self.hours {
            parts.push(format!("Hora={}", h));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Fail when a filtered view has nothing left to show
pub fn require_rows(table: &Table) -> Result<()> {
    if table.is_empty() {
        Err(PanelError::EmptySelection)
    } else {
        Ok(())
    }
}

/// Values offered for a dimension. Stages follow the `Orden` column when
/// the stage-order lookup provided one.
pub fn filter_options(table: &Table, dimension: Dimension) -> Vec<String> {
    let mut values = table.distinct_values(dimension.column());

    if dimension == Dimension::Etapa {
        if let (Some(etapa), Some(orden)) = (table.column_index(ETAPA), table.column_index(ORDEN)) {
            let mut order: HashMap<&str, f64> = HashMap::new();
            for row in table.rows() {
                let (Some(stage), Some(rank)) = (row[etapa].as_deref(), row[orden].as_deref()) else {
                    continue;
                };
                if let Ok(rank) = rank.replace(',', ".").parse::<f64>() {
                    let entry = order.entry(stage).or_insert(rank);
                    *entry = entry.min(rank);
                }
            }
            values.sort_by(|a, b| {
                let ra = order.get(a.as_str()).copied().unwrap_or(f64::INFINITY);
                let rb = order.get(b.as_str()).copied().unwrap_or(f64::INFINITY);
                ra.total_cmp(&rb).then_with(|| a.cmp(b))
            });
        }
    }

    values
}

/// Smallest and largest readable hour, the default slider position
pub fn hour_bounds(table: &Table) -> Option<HourRange> {
    let hours: Vec<u32> = table
        .column_values(HORA)?
        .into_iter()
        .filter_map(parse_hour)
        .collect();
    let min = *hours.iter().min()?;
    let max = *hours.iter().max()?;
    Some(HourRange::new(min, max))
}
