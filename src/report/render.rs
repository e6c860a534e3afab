//! Plain-text rendering of the views for the terminal

use super::{Comparison, Detail, Overview};
use crate::report::aggregate::{CrossTab, ValueCount};
use crate::table::Table;
use std::fmt::Write;

/// Shown wherever a percentage has no denominator
pub const NOT_AVAILABLE: &str = "N/A";

pub fn percent_or_na(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:.1}%", p),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Left-aligned text grid with a dashed rule under the header
pub fn grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", line(&rule));
    for row in rows {
        let _ = writeln!(out, "{}", line(row));
    }
    out
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn counts_grid(label: &str, counts: &[ValueCount]) -> String {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|c| vec![c.value.clone(), c.count.to_string()])
        .collect();
    grid(&strings(&[label, "Cantidad"]), &rows)
}

fn crosstab_grid(ct: &CrossTab) -> String {
    let mut headers = vec!["Gestor".to_string()];
    headers.extend(ct.hours.iter().map(|h| CrossTab::hour_label(*h)));
    let rows: Vec<Vec<String>> = ct
        .agents
        .iter()
        .zip(&ct.cells)
        .map(|(agent, cells)| {
            let mut row = vec![agent.clone()];
            row.extend(cells.iter().map(|v| v.to_string()));
            row
        })
        .collect();
    grid(&headers, &rows)
}

/// Render a table with nulls as blanks, at most `limit` rows
pub fn table_grid(table: &Table, limit: usize) -> String {
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|r| r.iter().map(|c| c.clone().unwrap_or_default()).collect())
        .collect();
    let mut out = grid(table.headers(), &rows);
    if table.len() > limit {
        let _ = writeln!(out, "... and {} more rows", table.len() - limit);
    }
    out
}

pub fn render_overview(view: &Overview) -> String {
    let mut out = String::new();
    let k = &view.kpis;

    let _ = writeln!(out, "Vista general ({})", view.filters);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Gestiones:            {}", k.gestiones);
    let _ = writeln!(out, "  Operaciones únicas:   {}", k.operaciones_unicas);
    let _ = writeln!(out, "  Contacto:             {}", k.contacto);
    let _ = writeln!(out, "  Directo:              {}", k.directo);
    let _ = writeln!(out, "  Compromisos:          {}", k.compromisos);
    let _ = writeln!(out);

    let _ = writeln!(out, "Embudo");
    let funnel: Vec<Vec<String>> = k
        .funnel()
        .iter()
        .map(|(stage, n)| vec![stage.to_string(), n.to_string()])
        .collect();
    let _ = writeln!(out, "{}", grid(&strings(&["Etapa", "Cantidad"]), &funnel));

    let _ = writeln!(out, "Primera gestión por gestor");
    let first: Vec<Vec<String>> = view
        .first_gestion
        .iter()
        .map(|f| vec![f.gestor.clone(), f.hora_gestion.clone()])
        .collect();
    let _ = writeln!(out, "{}", grid(&strings(&["Gestor", "HoraGestion"]), &first));

    let _ = writeln!(out, "Tipo de contacto");
    let _ = writeln!(out, "{}", counts_grid("TipoContacto", &view.contact_types));

    let _ = writeln!(out, "Resumen por gestor");
    let agents: Vec<Vec<String>> = view
        .agents
        .iter()
        .map(|a| {
            vec![
                a.gestor.clone(),
                a.gestiones.to_string(),
                a.cd.to_string(),
                a.compromisos.to_string(),
                a.contacto_directo.to_string(),
                percent_or_na(a.pct_directo),
            ]
        })
        .collect();
    let headers = strings(&["Gestor", "Gestiones", "CD", "Compromisos", "ContactoDirecto", "% Directo"]);
    let _ = writeln!(out, "{}", grid(&headers, &agents));

    let _ = writeln!(out, "Gestiones por gestor y hora");
    let _ = write!(out, "{}", crosstab_grid(&view.crosstab));
    out
}

pub fn render_detail(view: &Detail, limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detalle ({})", view.filters);
    let _ = writeln!(out);
    let _ = writeln!(out, "Respuestas");
    let _ = writeln!(out, "{}", counts_grid("Respuesta", &view.responses));
    let _ = writeln!(out, "Tipo de contacto");
    let _ = writeln!(out, "{}", counts_grid("TipoContacto", &view.contact_types));
    let _ = writeln!(out, "Gestiones ({} filas)", view.rows.len());
    let _ = write!(out, "{}", table_grid(&view.rows, limit));
    out
}

pub fn render_comparison(view: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparativo ({})", view.filters);
    let _ = writeln!(out);

    let _ = writeln!(out, "Gestiones por tipo de contacto y día");
    let by_type: Vec<Vec<String>> = view
        .by_type
        .iter()
        .map(|r| vec![r.tipo_contacto.clone(), r.mes_dia.clone(), r.gestiones.to_string()])
        .collect();
    let _ = writeln!(
        out,
        "{}",
        grid(&strings(&["TipoContacto", "MesDia", "Gestiones"]), &by_type)
    );

    let _ = writeln!(out, "Gestores por día");
    let headers = view.by_agent.column_names();
    let rows: Vec<Vec<String>> = view
        .by_agent
        .agents
        .iter()
        .map(|a| {
            let mut row = vec![a.gestor.clone()];
            for day in &a.days {
                match day {
                    Some(m) => row.extend([
                        m.gestiones.to_string(),
                        m.contacto_directo.to_string(),
                        m.compromisos.to_string(),
                        m.first_hora.clone().unwrap_or_default(),
                    ]),
                    None => row.extend(std::iter::repeat(String::new()).take(4)),
                }
            }
            row
        })
        .collect();
    let _ = write!(out, "{}", grid(&headers, &rows));
    out
}
