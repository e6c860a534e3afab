//! Input locations and metric rules for a pipeline run

use std::path::{Path, PathBuf};

/// Default directory holding the exports
pub const DEFAULT_DATA_DIR: &str = "Data";

/// Default split of the primary gestion export
pub const DEFAULT_PARTS: [&str; 5] = [
    "Gestion_part1.csv",
    "Gestion_part2.csv",
    "Gestion_part3.csv",
    "Gestion_part4.csv",
    "Gestion_part5.csv",
];

pub const DEFAULT_CONTACT_TYPES: &str = "TipoContacto.csv";
pub const DEFAULT_PRODUCTS: &str = "Producto.csv";
pub const DEFAULT_STAGE_ORDER: &str = "Orden etapa.csv";
pub const DEFAULT_CALENDAR: &str = "Semana.csv";

/// Paths of every file the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSources {
    /// Parts of the primary export, concatenated in this order
    pub primary: Vec<PathBuf>,
    pub contact_types: PathBuf,
    pub products: PathBuf,
    pub stage_order: PathBuf,
    pub calendar: PathBuf,
}

impl DataSources {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            primary: DEFAULT_PARTS.iter().map(|p| dir.join(p)).collect(),
            contact_types: dir.join(DEFAULT_CONTACT_TYPES),
            products: dir.join(DEFAULT_PRODUCTS),
            stage_order: dir.join(DEFAULT_STAGE_ORDER),
            calendar: dir.join(DEFAULT_CALENDAR),
        }
    }

    /// Replace the primary parts with names relative to `dir`
    pub fn with_parts<S: AsRef<str>>(mut self, dir: &Path, parts: &[S]) -> Self {
        self.primary = parts.iter().map(|p| dir.join(p.as_ref())).collect();
        self
    }

    /// Every input path, primary parts first
    pub fn all_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.primary.iter().map(PathBuf::as_path).collect();
        paths.push(&self.contact_types);
        paths.push(&self.products);
        paths.push(&self.stage_order);
        paths.push(&self.calendar);
        paths
    }
}

/// Sentinel codes and labels behind the derived columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricRules {
    /// Contact-type code meaning a direct response
    pub direct_code: String,
    /// Contact-type code meaning no contact was made
    pub no_contact_code: String,
    /// Channel label when `EsGestor` is 1
    pub agent_label: String,
    /// Channel label otherwise
    pub automated_label: String,
}

impl Default for MetricRules {
    fn default() -> Self {
        Self {
            direct_code: "CD".to_string(),
            no_contact_code: "NC".to_string(),
            agent_label: "Gestor".to_string(),
            automated_label: "Robot".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources() {
        let sources = DataSources::in_dir(Path::new("Data"));
        assert_eq!(sources.primary.len(), 5);
        assert_eq!(sources.primary[0], Path::new("Data/Gestion_part1.csv"));
        assert_eq!(sources.stage_order, Path::new("Data/Orden etapa.csv"));
        assert_eq!(sources.all_paths().len(), 9);
    }

    #[test]
    fn test_with_parts() {
        let dir = Path::new("exports");
        let sources = DataSources::in_dir(dir).with_parts(dir, &["gestiones_actualizado.csv"]);
        assert_eq!(sources.primary, vec![PathBuf::from("exports/gestiones_actualizado.csv")]);
        assert_eq!(sources.all_paths().len(), 5);
    }

    #[test]
    fn test_default_rules() {
        let rules = MetricRules::default();
        assert_eq!(rules.direct_code, "CD");
        assert_eq!(rules.no_contact_code, "NC");
    }
}
