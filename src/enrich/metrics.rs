//! Derived flag and counting columns

use crate::columns::*;
use crate::config::MetricRules;
use crate::error::Result;
use crate::table::{Cell, Table};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // HH:MM or HH:MM:SS, alone or after a date
    static ref TIME_OF_DAY: Regex = Regex::new(r"(?:^|[\sT])(\d{1,2}):(\d{2})(?::(\d{2}))?").unwrap();
}

/// Interpret a cell as a 0/1 flag. Numbers rounding to 1 or more are 1;
/// zero, negatives, non-finite, unparseable and null are 0.
pub fn parse_flag(value: Option<&str>) -> i64 {
    let Some(v) = value.map(str::trim) else {
        return 0;
    };
    match v.to_lowercase().as_str() {
        "true" | "verdadero" | "si" | "sí" | "s" => 1,
        "false" | "falso" | "no" | "n" => 0,
        other => other
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.round() >= 1.0)
            .map_or(0, |_| 1),
    }
}

/// Hour of day from `8`, `8.0`, `08:15:00` or `2025-11-21 08:15:00`
pub fn parse_hour(value: Option<&str>) -> Option<u32> {
    let v = value?.trim();
    if let Ok(f) = v.replace(',', ".").parse::<f64>() {
        if f.fract() == 0.0 && (0.0..24.0).contains(&f) {
            return Some(f as u32);
        }
        return None;
    }
    let caps = TIME_OF_DAY.captures(v)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    (hour < 24).then_some(hour)
}

fn flag_cell(value: i64) -> Cell {
    Some(value.to_string())
}

fn flag_cells(values: &[i64]) -> Vec<Cell> {
    values.iter().copied().map(flag_cell).collect()
}

/// Append the derived columns. Existing columns with the same names are
/// overwritten; no rows are added or removed.
pub fn add_metrics(table: &mut Table, rules: &MetricRules) -> Result<()> {
    table.require_columns("gestiones", &[CODIGO_TIPO_CONTACTO])?;

    let codes = table.column_values(CODIGO_TIPO_CONTACTO).unwrap_or_default();
    let direct: Vec<i64> = codes
        .iter()
        .map(|c| (c.map(str::trim) == Some(rules.direct_code.as_str())) as i64)
        .collect();
    let contact: Vec<i64> = codes
        .iter()
        .map(|c| (c.map(str::trim) != Some(rules.no_contact_code.as_str())) as i64)
        .collect();

    let robot: Option<Vec<Cell>> = table.column_values(ES_GESTOR).map(|values| {
        values
            .into_iter()
            .map(|v| {
                let label = if parse_flag(v) == 1 {
                    &rules.agent_label
                } else {
                    &rules.automated_label
                };
                Some(label.clone())
            })
            .collect()
    });

    let compromisos: Vec<i64> = match table.column_values(ES_COMPROMISO) {
        Some(values) => values.into_iter().map(parse_flag).collect(),
        None => {
            log::debug!("No '{}' column, commitments count as 0", ES_COMPROMISO);
            vec![0; table.len()]
        }
    };

    let derived_hour: Option<Vec<Cell>> = if table.has_column(HORA) {
        None
    } else {
        table.column_values(HORA_GESTION).map(|values| {
            values
                .into_iter()
                .map(|v| parse_hour(v).map(|h| h.to_string()))
                .collect()
        })
    };

    table.set_column(ES_CONTACTO_DIRECTO, flag_cells(&direct));
    table.set_column(ES_CONTACTO, flag_cells(&contact));
    if let Some(robot) = robot {
        table.set_column(ROBOT, robot);
    }
    table.set_column(GESTIONES, vec![flag_cell(1); table.len()]);
    table.set_column(CD, flag_cells(&direct));
    table.set_column(CONTACTO, flag_cells(&contact));
    table.set_column(CONTACTO_DIRECTO, flag_cells(&direct));
    table.set_column(COMPROMISOS, flag_cells(&compromisos));
    if let Some(hours) = derived_hour {
        log::debug!("Deriving '{}' from '{}'", HORA, HORA_GESTION);
        table.set_column(HORA, hours);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_strs(
            &["CodigoTipoContacto", "EsGestor", "EsCompromiso", "HoraGestion"],
            &[
                &["CD", "1", "1", "08:05:00"],
                &["NC", "0", "0", "09:10:00"],
                &["CI", "", "True", "13:00:00"],
                &["", "1.0", "", "bad"],
            ],
        )
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(Some("1")), 1);
        assert_eq!(parse_flag(Some(" 1.0 ")), 1);
        assert_eq!(parse_flag(Some("True")), 1);
        assert_eq!(parse_flag(Some("0")), 0);
        assert_eq!(parse_flag(Some("abc")), 0);
        assert_eq!(parse_flag(None), 0);
    }

    #[test]
    fn test_parse_flag_clamps_out_of_range_numbers() {
        assert_eq!(parse_flag(Some("inf")), 0);
        assert_eq!(parse_flag(Some("-inf")), 0);
        assert_eq!(parse_flag(Some("NaN")), 0);
        assert_eq!(parse_flag(Some("-1")), 0);
        assert_eq!(parse_flag(Some("2")), 1);
        assert_eq!(parse_flag(Some("1e300")), 1);
        assert_eq!(parse_flag(Some("0.4")), 0);
    }

    #[test]
    fn test_parse_hour() {
        assert_eq!(parse_hour(Some("8")), Some(8));
        assert_eq!(parse_hour(Some("14.0")), Some(14));
        assert_eq!(parse_hour(Some("08:15:00")), Some(8));
        assert_eq!(parse_hour(Some("2025-11-21 19:02:11")), Some(19));
        assert_eq!(parse_hour(Some("2025-11-21T07:00")), Some(7));
        assert_eq!(parse_hour(Some("25")), None);
        assert_eq!(parse_hour(Some("8.5")), None);
        assert_eq!(parse_hour(Some("")), None);
        assert_eq!(parse_hour(None), None);
    }

    #[test]
    fn test_contact_flags_follow_sentinels() {
        let mut t = sample();
        add_metrics(&mut t, &MetricRules::default()).unwrap();

        let contacto: Vec<_> = t.column_values("Contacto").unwrap();
        let directo: Vec<_> = t.column_values("ContactoDirecto").unwrap();
        assert_eq!(contacto, vec![Some("1"), Some("0"), Some("1"), Some("1")]);
        assert_eq!(directo, vec![Some("1"), Some("0"), Some("0"), Some("0")]);
        assert_eq!(t.column_values("CD").unwrap(), directo);
        assert_eq!(t.column_values("EsContacto").unwrap(), contacto);
    }

    #[test]
    fn test_robot_counting_and_commitments() {
        let mut t = sample();
        add_metrics(&mut t, &MetricRules::default()).unwrap();

        assert_eq!(
            t.column_values("Robot").unwrap(),
            vec![Some("Gestor"), Some("Robot"), Some("Robot"), Some("Gestor")]
        );
        assert!(t.column_values("Gestiones").unwrap().iter().all(|v| *v == Some("1")));
        assert_eq!(
            t.column_values("Compromisos").unwrap(),
            vec![Some("1"), Some("0"), Some("1"), Some("0")]
        );
        assert_eq!(
            t.column_values("Hora").unwrap(),
            vec![Some("8"), Some("9"), Some("13"), None]
        );
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_robot_absent_without_indicator() {
        let mut t = Table::from_strs(&["CodigoTipoContacto", "Hora"], &[&["CD", "10"]]);
        add_metrics(&mut t, &MetricRules::default()).unwrap();
        assert!(!t.has_column("Robot"));
        assert_eq!(t.get(0, "Compromisos"), Some("0"));
        assert_eq!(t.get(0, "Hora"), Some("10"));
    }

    #[test]
    fn test_custom_sentinels() {
        let rules = MetricRules {
            direct_code: "1".to_string(),
            no_contact_code: "3".to_string(),
            ..MetricRules::default()
        };
        let mut t = Table::from_strs(&["CodigoTipoContacto"], &[&["1"], &["2"], &["3"]]);
        add_metrics(&mut t, &rules).unwrap();
        assert_eq!(
            t.column_values("EsContactoDirecto").unwrap(),
            vec![Some("1"), Some("0"), Some("0")]
        );
        assert_eq!(
            t.column_values("EsContacto").unwrap(),
            vec![Some("1"), Some("1"), Some("0")]
        );
    }
}
