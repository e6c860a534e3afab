pub mod columns;
pub mod config;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod table;
pub mod xlsx;

pub use config::{DataSources, MetricRules};
pub use error::{PanelError, Result};
pub use pipeline::{load_all, PanelCache};
pub use table::{Cell, Table};
