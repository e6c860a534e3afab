use crate::error::Result;
use crate::table::Table;
use std::collections::HashMap;

/// Left outer join of `left` against `lookup` on `key`.
///
/// Keys are trimmed on both sides. When the lookup holds several rows with
/// the same trimmed key the first one wins, so the output always has exactly
/// one row per left row, in left order. Unmatched rows get null lookup cells.
/// Lookup columns whose names already exist on the left are not joined.
pub fn left_join(left: &Table, lookup: &Table, key: &str, lookup_name: &str) -> Result<Table> {
    left.require_columns("gestiones", &[key])?;
    lookup.require_columns(lookup_name, &[key])?;

    let left_key = left.column_index(key).unwrap_or_default();
    let lookup_key = lookup.column_index(key).unwrap_or_default();

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = 0;
    for (i, row) in lookup.rows().iter().enumerate() {
        let Some(k) = row[lookup_key].as_deref().map(str::trim) else {
            continue;
        };
        if index.contains_key(k) {
            duplicates += 1;
        } else {
            index.insert(k, i);
        }
    }
    if duplicates > 0 {
        log::warn!(
            "{}: {} duplicate keys on '{}', first row kept",
            lookup_name,
            duplicates,
            key
        );
    }

    // Lookup columns to carry over
    let mut carried: Vec<usize> = Vec::new();
    for (i, name) in lookup.headers().iter().enumerate() {
        if i == lookup_key {
            continue;
        }
        if left.has_column(name) {
            log::warn!(
                "{}: column '{}' already present, not joined",
                lookup_name,
                name
            );
            continue;
        }
        carried.push(i);
    }

    let mut headers = left.headers().to_vec();
    headers.extend(carried.iter().map(|&i| lookup.headers()[i].clone()));
    let mut out = Table::new(headers);

    let mut unmatched = 0;
    for row in left.rows() {
        let matched = row[left_key]
            .as_deref()
            .map(str::trim)
            .and_then(|k| index.get(k))
            .map(|&i| &lookup.rows()[i]);

        let mut full = row.clone();
        match matched {
            Some(hit) => full.extend(carried.iter().map(|&i| hit[i].clone())),
            None => {
                unmatched += 1;
                full.extend(carried.iter().map(|_| None));
            }
        }
        out.push_row(full);
    }

    if unmatched > 0 {
        log::debug!(
            "{}: {} of {} rows without match on '{}'",
            lookup_name,
            unmatched,
            left.len(),
            key
        );
    }

    Ok(out)
}
