//! Grouped sums, distinct counts and cross-tabulations over a filtered table

use crate::columns::*;
use crate::enrich::{parse_flag, parse_hour};
use crate::error::Result;
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Group label for rows whose key is null
pub const UNDEFINED_LABEL: &str = "(sin definir)";

fn label(cell: Option<&str>) -> String {
    cell.unwrap_or(UNDEFINED_LABEL).to_string()
}

/// Sum a numeric column; unparseable cells count as 0
pub fn sum_column(table: &Table, column: &str) -> Result<i64> {
    table.require_columns("gestiones", &[column])?;
    let idx = table.column_index(column).unwrap_or_default();
    Ok(table.rows().iter().map(|r| parse_flag(r[idx].as_deref())).sum())
}

/// Number of distinct non-null values
pub fn distinct_count(table: &Table, column: &str) -> Result<usize> {
    table.require_columns("gestiones", &[column])?;
    let idx = table.column_index(column).unwrap_or_default();
    let set: HashSet<&str> = table.rows().iter().filter_map(|r| r[idx].as_deref()).collect();
    Ok(set.len())
}

/// Direct contacts as a share of gestiones, rounded to one decimal.
/// `None` when there are no gestiones.
pub fn percent_directo(directo: i64, gestiones: i64) -> Option<f64> {
    if gestiones == 0 {
        return None;
    }
    let pct = directo as f64 / gestiones as f64 * 100.0;
    Some((pct * 10.0).round() / 10.0)
}

/// Headline numbers of the overview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub gestiones: i64,
    pub operaciones_unicas: usize,
    pub contacto: i64,
    pub directo: i64,
    pub compromisos: i64,
}

impl Kpis {
    /// Funnel stages, widest first
    pub fn funnel(&self) -> [(&'static str, i64); 4] {
        [
            ("Operaciones", self.operaciones_unicas as i64),
            ("Contacto", self.contacto),
            ("Directo", self.directo),
            ("Compromisos", self.compromisos),
        ]
    }
}

pub fn kpis(table: &Table) -> Result<Kpis> {
    Ok(Kpis {
        gestiones: sum_column(table, GESTIONES)?,
        operaciones_unicas: distinct_count(table, NUMERO_OPERACION)?,
        contacto: sum_column(table, CONTACTO)?,
        directo: sum_column(table, CONTACTO_DIRECTO)?,
        compromisos: sum_column(table, COMPROMISOS)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstGestion {
    #[serde(rename = "Gestor")]
    pub gestor: String,
    #[serde(rename = "HoraGestion")]
    pub hora_gestion: String,
}

/// Earliest `HoraGestion` per agent, ordered by that time.
/// Agents whose times are all null are left out.
pub fn first_gestion_by_agent(table: &Table) -> Result<Vec<FirstGestion>> {
    table.require_columns("gestiones", &[GESTOR, HORA_GESTION])?;
    let gestor = table.column_index(GESTOR).unwrap_or_default();
    let hora = table.column_index(HORA_GESTION).unwrap_or_default();

    let mut earliest: BTreeMap<String, &str> = BTreeMap::new();
    for row in table.rows() {
        let Some(time) = row[hora].as_deref() else {
            continue;
        };
        let entry = earliest.entry(label(row[gestor].as_deref())).or_insert(time);
        if time < *entry {
            *entry = time;
        }
    }

    let mut out: Vec<FirstGestion> = earliest
        .into_iter()
        .map(|(gestor, time)| FirstGestion {
            gestor,
            hora_gestion: time.to_string(),
        })
        .collect();
    out.sort_by(|a, b| {
        a.hora_gestion
            .cmp(&b.hora_gestion)
            .then_with(|| a.gestor.cmp(&b.gestor))
    });
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    #[serde(rename = "Gestor")]
    pub gestor: String,
    #[serde(rename = "Gestiones")]
    pub gestiones: i64,
    #[serde(rename = "CD")]
    pub cd: i64,
    #[serde(rename = "Compromisos")]
    pub compromisos: i64,
    #[serde(rename = "ContactoDirecto")]
    pub contacto_directo: i64,
    #[serde(rename = "% Directo")]
    pub pct_directo: Option<f64>,
}

/// Per-agent sums with `% Directo`, ordered by agent name
pub fn agent_summary(table: &Table) -> Result<Vec<AgentSummary>> {
    table.require_columns(
        "gestiones",
        &[GESTOR, GESTIONES, CD, COMPROMISOS, CONTACTO_DIRECTO],
    )?;
    let idx = |c: &str| table.column_index(c).unwrap_or_default();
    let (gestor, gestiones, cd, compromisos, directo) = (
        idx(GESTOR),
        idx(GESTIONES),
        idx(CD),
        idx(COMPROMISOS),
        idx(CONTACTO_DIRECTO),
    );

    let mut sums: BTreeMap<String, [i64; 4]> = BTreeMap::new();
    for row in table.rows() {
        let entry = sums.entry(label(row[gestor].as_deref())).or_default();
        entry[0] += parse_flag(row[gestiones].as_deref());
        entry[1] += parse_flag(row[cd].as_deref());
        entry[2] += parse_flag(row[compromisos].as_deref());
        entry[3] += parse_flag(row[directo].as_deref());
    }

    Ok(sums
        .into_iter()
        .map(|(gestor, [g, cd, comp, dir])| AgentSummary {
            gestor,
            gestiones: g,
            cd,
            compromisos: comp,
            contacto_directo: dir,
            pct_directo: percent_directo(dir, g),
        })
        .collect())
}

/// Agent × hour table of summed gestiones, zero-filled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTab {
    pub agents: Vec<String>,
    /// Ascending; `None` collects rows without a readable hour and sorts last
    pub hours: Vec<Option<u32>>,
    /// `cells[agent][hour]`
    pub cells: Vec<Vec<i64>>,
}

impl CrossTab {
    pub fn total(&self) -> i64 {
        self.cells.iter().flatten().sum()
    }

    pub fn hour_label(hour: Option<u32>) -> String {
        hour.map(|h| h.to_string())
            .unwrap_or_else(|| UNDEFINED_LABEL.to_string())
    }
}

pub fn hour_crosstab(table: &Table) -> Result<CrossTab> {
    table.require_columns("gestiones", &[GESTOR, HORA, GESTIONES])?;
    let gestor = table.column_index(GESTOR).unwrap_or_default();
    let hora = table.column_index(HORA).unwrap_or_default();
    let gestiones = table.column_index(GESTIONES).unwrap_or_default();

    let mut sums: BTreeMap<(String, Option<u32>), i64> = BTreeMap::new();
    let mut agents: BTreeSet<String> = BTreeSet::new();
    let mut hours: BTreeSet<Option<u32>> = BTreeSet::new();
    for row in table.rows() {
        let agent = label(row[gestor].as_deref());
        let hour = parse_hour(row[hora].as_deref());
        agents.insert(agent.clone());
        hours.insert(hour);
        *sums.entry((agent, hour)).or_default() += parse_flag(row[gestiones].as_deref());
    }

    // Option orders None first; the undefined bucket goes last
    let mut hours: Vec<Option<u32>> = hours.into_iter().collect();
    if hours.first() == Some(&None) {
        hours.remove(0);
        hours.push(None);
    }
    let agents: Vec<String> = agents.into_iter().collect();

    let cells = agents
        .iter()
        .map(|a| {
            hours
                .iter()
                .map(|h| sums.get(&(a.clone(), *h)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        agents,
        hours,
        cells,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Row counts per value, most frequent first, nulls as `(sin definir)`
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<ValueCount>> {
    table.require_columns("gestiones", &[column])?;
    let idx = table.column_index(column).unwrap_or_default();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in table.rows() {
        *counts.entry(label(row[idx].as_deref())).or_default() += 1;
    }

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(out)
}

/// Record-level columns for the detail view, ordered by `HoraGestion`
pub fn detail_rows(table: &Table) -> Result<Table> {
    let present: Vec<&str> = DETAIL_COLUMNS
        .iter()
        .copied()
        .filter(|c| table.has_column(c))
        .collect();
    let selected = table.select("gestiones", &present)?;

    let Some(hora) = selected.column_index(HORA_GESTION) else {
        return Ok(selected);
    };
    let mut rows = selected.rows().to_vec();
    // Nulls last, stable for ties
    rows.sort_by(|a, b| match (&a[hora], &b[hora]) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut sorted = Table::new(selected.headers().to_vec());
    for row in rows {
        sorted.push_row(row);
    }
    Ok(sorted)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDayCount {
    #[serde(rename = "TipoContacto")]
    pub tipo_contacto: String,
    #[serde(rename = "MesDia")]
    pub mes_dia: String,
    #[serde(rename = "Gestiones")]
    pub gestiones: i64,
}

/// Gestiones per (contact type, day), ordered by type then day
pub fn gestiones_by_type_and_day(table: &Table) -> Result<Vec<TypeDayCount>> {
    table.require_columns("gestiones", &[TIPO_CONTACTO, MES_DIA, GESTIONES])?;
    let tipo = table.column_index(TIPO_CONTACTO).unwrap_or_default();
    let dia = table.column_index(MES_DIA).unwrap_or_default();
    let gestiones = table.column_index(GESTIONES).unwrap_or_default();

    let mut sums: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in table.rows() {
        let key = (label(row[tipo].as_deref()), label(row[dia].as_deref()));
        *sums.entry(key).or_default() += parse_flag(row[gestiones].as_deref());
    }

    Ok(sums
        .into_iter()
        .map(|((tipo_contacto, mes_dia), gestiones)| TypeDayCount {
            tipo_contacto,
            mes_dia,
            gestiones,
        })
        .collect())
}

/// One agent's numbers on one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayMetrics {
    pub gestiones: i64,
    pub contacto_directo: i64,
    pub compromisos: i64,
    pub first_hora: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDays {
    pub gestor: String,
    /// Aligned with `DayComparison::days`; `None` when the agent has no rows that day
    pub days: Vec<Option<DayMetrics>>,
}

/// Agents side by side across calendar days
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayComparison {
    pub days: Vec<String>,
    pub agents: Vec<AgentDays>,
}

impl DayComparison {
    pub const METRICS: [&'static str; 4] =
        ["Gestiones", "ContactoDirecto", "Compromisos", "HoraGestion"];

    /// Wide headers: `Gestor` then `"{day} {metric}"` per day and metric
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![GESTOR.to_string()];
        for day in &self.days {
            for metric in Self::METRICS {
                names.push(format!("{} {}", day, metric));
            }
        }
        names
    }
}

pub fn agent_day_comparison(table: &Table) -> Result<DayComparison> {
    table.require_columns(
        "gestiones",
        &[GESTOR, MES_DIA, GESTIONES, CONTACTO_DIRECTO, COMPROMISOS],
    )?;
    let idx = |c: &str| table.column_index(c).unwrap_or_default();
    let (gestor, dia, gestiones, directo, compromisos) = (
        idx(GESTOR),
        idx(MES_DIA),
        idx(GESTIONES),
        idx(CONTACTO_DIRECTO),
        idx(COMPROMISOS),
    );
    let hora = table.column_index(HORA_GESTION);

    let mut groups: BTreeMap<(String, String), DayMetrics> = BTreeMap::new();
    let mut days: BTreeSet<String> = BTreeSet::new();
    for row in table.rows() {
        let day = label(row[dia].as_deref());
        days.insert(day.clone());
        let m = groups
            .entry((label(row[gestor].as_deref()), day))
            .or_default();
        m.gestiones += parse_flag(row[gestiones].as_deref());
        m.contacto_directo += parse_flag(row[directo].as_deref());
        m.compromisos += parse_flag(row[compromisos].as_deref());
        if let Some(time) = hora.and_then(|i| row[i].as_deref()) {
            if m.first_hora.as_deref().map_or(true, |t| time < t) {
                m.first_hora = Some(time.to_string());
            }
        }
    }

    let days: Vec<String> = days.into_iter().collect();
    let mut agents: Vec<AgentDays> = Vec::new();
    for ((agent, day), metrics) in groups {
        let pos = days.iter().position(|d| *d == day).unwrap_or_default();
        if agents.last().map(|a| &a.gestor) != Some(&agent) {
            agents.push(AgentDays {
                gestor: agent,
                days: vec![None; days.len()],
            });
        }
        if let Some(last) = agents.last_mut() {
            last.days[pos] = Some(metrics);
        }
    }

    Ok(DayComparison { days, agents })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five gestiones across two agents with known flags
    fn sample() -> Table {
        Table::from_strs(
            &[
                "NumeroOperacion", "Gestor", "Hora", "HoraGestion", "Gestiones",
                "Contacto", "ContactoDirecto", "CD", "Compromisos", "TipoContacto", "MesDia",
            ],
            &[
                &["100", "Ana", "8", "08:10:00", "1", "1", "1", "1", "1", "Directo", "11-20"],
                &["100", "Ana", "9", "09:00:00", "1", "0", "0", "0", "0", "", "11-21"],
                &["101", "Ana", "9", "09:30:00", "1", "1", "0", "0", "0", "Indirecto", "11-21"],
                &["102", "Luis", "8", "08:45:00", "1", "1", "1", "1", "1", "Directo", "11-21"],
                &["103", "Luis", "10", "10:05:00", "1", "1", "1", "1", "0", "Directo", "11-21"],
            ],
        )
    }

    #[test]
    fn test_kpis_match_hand_counts() {
        let k = kpis(&sample()).unwrap();
        assert_eq!(
            k,
            Kpis {
                gestiones: 5,
                operaciones_unicas: 4,
                contacto: 4,
                directo: 3,
                compromisos: 2,
            }
        );
        assert_eq!(k.funnel()[0], ("Operaciones", 4));
    }

    #[test]
    fn test_agent_summary_percentages() {
        let rows = agent_summary(&sample()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].gestor, "Ana");
        assert_eq!(rows[0].gestiones, 3);
        assert_eq!(rows[0].contacto_directo, 1);
        assert_eq!(rows[0].pct_directo, Some(33.3));

        assert_eq!(rows[1].gestor, "Luis");
        assert_eq!(rows[1].cd, 2);
        assert_eq!(rows[1].compromisos, 1);
        assert_eq!(rows[1].pct_directo, Some(100.0));
    }

    #[test]
    fn test_sums_ignore_non_flag_values() {
        let t = Table::from_strs(
            &["NumeroOperacion", "Gestor", "Gestiones", "CD", "Contacto", "ContactoDirecto", "Compromisos"],
            &[
                &["1", "Ana", "1", "1", "1", "1", "inf"],
                &["2", "Ana", "1", "0", "1", "0", "inf"],
                &["3", "Ana", "1", "0", "1", "0", "-1"],
            ],
        );
        let k = kpis(&t).unwrap();
        assert_eq!(k.gestiones, 3);
        assert_eq!(k.compromisos, 0);

        let rows = agent_summary(&t).unwrap();
        assert_eq!(rows[0].compromisos, 0);
        assert_eq!(rows[0].pct_directo, Some(33.3));
    }

    #[test]
    fn test_percent_directo_zero_denominator() {
        assert_eq!(percent_directo(0, 0), None);
        assert_eq!(percent_directo(2, 3), Some(66.7));
        assert_eq!(percent_directo(0, 4), Some(0.0));
    }

    #[test]
    fn test_first_gestion_sorted_by_time() {
        let rows = first_gestion_by_agent(&sample()).unwrap();
        assert_eq!(rows[0].gestor, "Ana");
        assert_eq!(rows[0].hora_gestion, "08:10:00");
        assert_eq!(rows[1].gestor, "Luis");
        assert_eq!(rows[1].hora_gestion, "08:45:00");
    }

    #[test]
    fn test_crosstab_zero_fills_and_preserves_total() {
        let t = sample();
        let ct = hour_crosstab(&t).unwrap();
        assert_eq!(ct.agents, vec!["Ana", "Luis"]);
        assert_eq!(ct.hours, vec![Some(8), Some(9), Some(10)]);
        assert_eq!(ct.cells[0], vec![1, 2, 0]);
        assert_eq!(ct.cells[1], vec![1, 0, 1]);
        assert_eq!(ct.total(), sum_column(&t, "Gestiones").unwrap());
    }

    #[test]
    fn test_crosstab_keeps_null_keys() {
        let t = Table::from_strs(
            &["Gestor", "Hora", "Gestiones"],
            &[&["Ana", "8", "1"], &["", "9", "1"], &["Ana", "", "1"]],
        );
        let ct = hour_crosstab(&t).unwrap();
        assert_eq!(ct.agents, vec![UNDEFINED_LABEL, "Ana"]);
        assert_eq!(ct.hours, vec![Some(8), Some(9), None]);
        assert_eq!(ct.total(), 3);
        assert_eq!(CrossTab::hour_label(None), UNDEFINED_LABEL);
    }

    #[test]
    fn test_value_counts_with_undefined_bucket() {
        let counts = value_counts(&sample(), "TipoContacto").unwrap();
        assert_eq!(counts[0], ValueCount { value: "Directo".into(), count: 3 });
        assert_eq!(counts[1], ValueCount { value: UNDEFINED_LABEL.into(), count: 1 });
        assert_eq!(counts[2], ValueCount { value: "Indirecto".into(), count: 1 });
    }

    #[test]
    fn test_detail_rows_sorted_by_time() {
        let rows = detail_rows(&sample()).unwrap();
        assert_eq!(rows.headers(), &["Gestor", "HoraGestion", "TipoContacto"]);
        let times: Vec<_> = rows.column_values("HoraGestion").unwrap();
        assert_eq!(
            times,
            vec![
                Some("08:10:00"),
                Some("08:45:00"),
                Some("09:00:00"),
                Some("09:30:00"),
                Some("10:05:00")
            ]
        );
    }

    #[test]
    fn test_type_day_counts() {
        let rows = gestiones_by_type_and_day(&sample()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            TypeDayCount {
                tipo_contacto: UNDEFINED_LABEL.into(),
                mes_dia: "11-21".into(),
                gestiones: 1
            }
        );
        assert_eq!(rows[1].tipo_contacto, "Directo");
        assert_eq!(rows[1].mes_dia, "11-20");
        assert_eq!(rows[2].gestiones, 2);
    }

    #[test]
    fn test_agent_day_comparison() {
        let cmp = agent_day_comparison(&sample()).unwrap();
        assert_eq!(cmp.days, vec!["11-20", "11-21"]);
        assert_eq!(cmp.agents.len(), 2);

        let ana = &cmp.agents[0];
        assert_eq!(ana.gestor, "Ana");
        let d20 = ana.days[0].as_ref().unwrap();
        assert_eq!(d20.gestiones, 1);
        assert_eq!(d20.first_hora.as_deref(), Some("08:10:00"));
        let d21 = ana.days[1].as_ref().unwrap();
        assert_eq!(d21.gestiones, 2);
        assert_eq!(d21.first_hora.as_deref(), Some("09:00:00"));

        // Luis has no rows on 11-20
        assert!(cmp.agents[1].days[0].is_none());
        assert_eq!(cmp.agents[1].days[1].as_ref().unwrap().contacto_directo, 2);

        let names = cmp.column_names();
        assert_eq!(names.len(), 1 + 2 * 4);
        assert_eq!(names[1], "11-20 Gestiones");
        assert_eq!(names[8], "11-21 HoraGestion");
    }
}
