use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use gestiones_panel::columns::*;
use gestiones_panel::config::{self, DataSources, MetricRules};
use gestiones_panel::pipeline::{load_all, load_primary, PanelCache};
use gestiones_panel::report::{self, render, Choice, Dimension, FilterSet, HourRange};
use gestiones_panel::source::load_csv;
use gestiones_panel::{snapshot, xlsx, PanelError, Table};

#[derive(Parser)]
#[command(name = "gestiones-panel")]
#[command(about = "Load, enrich and report call-center gestion exports", long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DataArgs {
    /// Directory holding the CSV exports
    #[arg(long, global = true, env = "GESTIONES_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Parts of the primary export, relative to the data directory
    #[arg(long, global = true, value_delimiter = ',')]
    parts: Vec<String>,

    /// Contact-type lookup file name
    #[arg(long, global = true, default_value = config::DEFAULT_CONTACT_TYPES)]
    contact_types: String,

    /// Product lookup file name
    #[arg(long, global = true, default_value = config::DEFAULT_PRODUCTS)]
    products: String,

    /// Stage-order lookup file name
    #[arg(long, global = true, default_value = config::DEFAULT_STAGE_ORDER)]
    stage_order: String,

    /// Calendar lookup file name
    #[arg(long, global = true, default_value = config::DEFAULT_CALENDAR)]
    calendar: String,

    /// Contact-type code of a direct response
    #[arg(long, global = true, default_value = "CD")]
    direct_code: String,

    /// Contact-type code of a call without contact
    #[arg(long, global = true, default_value = "NC")]
    no_contact_code: String,
}

impl DataArgs {
    fn sources(&self) -> DataSources {
        let dir = &self.data_dir;
        let mut sources = DataSources::in_dir(dir);
        if !self.parts.is_empty() {
            sources = sources.with_parts(dir, &self.parts);
        }
        sources.contact_types = dir.join(&self.contact_types);
        sources.products = dir.join(&self.products);
        sources.stage_order = dir.join(&self.stage_order);
        sources.calendar = dir.join(&self.calendar);
        sources
    }

    fn rules(&self) -> MetricRules {
        MetricRules {
            direct_code: self.direct_code.clone(),
            no_contact_code: self.no_contact_code.clone(),
            ..MetricRules::default()
        }
    }
}

/// Dashboard filters; omitted or `Todas` means no filtering
#[derive(Args, Clone)]
struct FilterArgs {
    /// Gestion date (FechaGestion)
    #[arg(long)]
    fecha: Option<String>,

    #[arg(long)]
    supervisor: Option<String>,

    #[arg(long)]
    gestor: Option<String>,

    #[arg(long)]
    etapa: Option<String>,

    #[arg(long)]
    estrategia: Option<String>,

    #[arg(long)]
    producto: Option<String>,

    /// Gestor or Robot
    #[arg(long)]
    canal: Option<String>,

    /// Hour range, e.g. 8-12
    #[arg(long)]
    hours: Option<String>,
}

impl FilterArgs {
    fn to_filter_set(&self) -> Result<FilterSet> {
        let mut filters = FilterSet::new();
        let choices = [
            (Dimension::Fecha, &self.fecha),
            (Dimension::Supervisor, &self.supervisor),
            (Dimension::Gestor, &self.gestor),
            (Dimension::Etapa, &self.etapa),
            (Dimension::Estrategia, &self.estrategia),
            (Dimension::Producto, &self.producto),
            (Dimension::Canal, &self.canal),
        ];
        for (dimension, value) in choices {
            if let Some(value) = value {
                filters.set(dimension, Choice::parse(value));
            }
        }
        if let Some(ref hours) = self.hours {
            filters.set_hours(Some(HourRange::parse(hours)?));
        }
        Ok(filters)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// KPIs, funnel, per-agent summary and agent x hour table
    Overview {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Response and contact-type counts plus record-level rows
    Detail {
        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum rows to print
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Compare gestiones across calendar days
    Compare {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Write every view to an Excel workbook
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output Excel file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the per-agent summary as CSV
        #[arg(long)]
        agents_csv: Option<PathBuf>,
    },

    /// Write the enriched table back to CSV (UTF-8 with BOM)
    Snapshot {
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Only concatenate the primary parts, without joins or metrics
        #[arg(long)]
        raw: bool,
    },

    /// Display row counts, columns and filter options
    Info,

    /// Check that every input exists and carries the expected columns
    Validate,

    /// Read filter commands from stdin and redraw views
    Interactive,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let sources = cli.data.sources();
    let rules = cli.data.rules();

    match cli.command {
        Commands::Overview { filters } => {
            let table = load(&sources, &rules)?;
            let filters = filters.to_filter_set()?;
            if let Some(view) = warn_empty(report::overview(&table, &filters))? {
                print!("{}", render::render_overview(&view));
            }
        }
        Commands::Detail { filters, limit } => {
            let table = load(&sources, &rules)?;
            let filters = filters.to_filter_set()?;
            if let Some(view) = warn_empty(report::detail(&table, &filters))? {
                print!("{}", render::render_detail(&view, limit));
            }
        }
        Commands::Compare { filters } => {
            let table = load(&sources, &rules)?;
            let filters = filters.to_filter_set()?;
            if let Some(view) = warn_empty(report::comparison(&table, &filters))? {
                print!("{}", render::render_comparison(&view));
            }
        }
        Commands::Export { filters, output, agents_csv } => {
            let table = load(&sources, &rules)?;
            let filters = filters.to_filter_set()?;
            export(&table, &filters, &output, agents_csv.as_deref())?;
        }
        Commands::Snapshot { output, raw } => {
            let table = if raw {
                load_primary(&sources.primary).context("Failed to read primary export")?
            } else {
                load(&sources, &rules)?
            };
            println!("Writing CSV file: {}", output.display());
            snapshot::write_snapshot(&table, &output).context("Failed to write snapshot")?;
            println!("Done!");
        }
        Commands::Info => {
            let table = load(&sources, &rules)?;
            info(&table);
        }
        Commands::Validate => {
            validate(&sources)?;
        }
        Commands::Interactive => {
            interactive(&sources, &rules)?;
        }
    }

    Ok(())
}

fn load(sources: &DataSources, rules: &MetricRules) -> Result<Table> {
    println!("Reading {} export part(s) and 4 lookups", sources.primary.len());
    let table = load_all(sources, rules).context("Failed to load gestion data")?;
    println!("Loaded {} gestiones", table.len());
    println!();
    Ok(table)
}

/// An empty selection is a warning, not a failure
fn warn_empty<T>(result: gestiones_panel::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(view) => Ok(Some(view)),
        Err(PanelError::EmptySelection) => {
            println!("Warning: no rows match the selected filters");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn export(table: &Table, filters: &FilterSet, output: &Path, agents_csv: Option<&Path>) -> Result<()> {
    let Some(overview) = warn_empty(report::overview(table, filters))? else {
        return Ok(());
    };
    let detail = report::detail(table, filters).context("Failed to build detail view")?;

    // Without a calendar the comparison sheet is left out
    let comparison = match report::comparison(table, filters) {
        Ok(view) => Some(view),
        Err(PanelError::MissingColumns { columns, .. }) => {
            println!("Warning: skipping comparison sheet, missing {}", columns.join(", "));
            None
        }
        Err(e) => return Err(e.into()),
    };

    println!("Writing Excel file: {}", output.display());
    xlsx::write_views_to_xlsx(&overview, Some(&detail), comparison.as_ref(), output)
        .context("Failed to write Excel file")?;

    if let Some(path) = agents_csv {
        println!("Writing CSV file: {}", path.display());
        snapshot::write_rows_csv(&overview.agents, path).context("Failed to write agent summary")?;
    }

    println!("Done!");
    Ok(())
}

fn info(table: &Table) {
    println!("Rows: {}", table.len());
    println!("Columns: {}", table.headers().len());
    for header in table.headers() {
        println!("  {}", header);
    }
    println!();

    println!("Filter options:");
    for dimension in Dimension::ALL {
        let options = report::filter_options(table, dimension);
        if options.is_empty() {
            println!("  {}: (column {} not present)", dimension, dimension.column());
            continue;
        }
        let shown: Vec<&str> = options.iter().take(10).map(String::as_str).collect();
        print!("  {}: {}", dimension, shown.join(", "));
        if options.len() > 10 {
            print!(" ... and {} more", options.len() - 10);
        }
        println!();
    }

    match report::hour_bounds(table) {
        Some(range) => println!("Hours: {}", range),
        None => println!("Hours: none readable"),
    }
}

fn validate(sources: &DataSources) -> Result<()> {
    let mut issues = Vec::new();

    const PRIMARY_KEYS: &[&str] = &[CODIGO_TIPO_CONTACTO, PRODUCTO_GESTION, ETAPA, FECHA_GESTION];
    const CONTACT_TYPE_KEYS: &[&str] = &[CODIGO_TIPO_CONTACTO];
    const PRODUCT_KEYS: &[&str] = &[PRODUCTO_GESTION, PRODUCTO];
    const STAGE_KEYS: &[&str] = &[ETAPA];
    const NO_KEYS: &[&str] = &[];

    let mut checks: Vec<(&Path, &[&str])> = sources
        .primary
        .iter()
        .map(|p| (p.as_path(), PRIMARY_KEYS))
        .collect();
    checks.push((sources.contact_types.as_path(), CONTACT_TYPE_KEYS));
    checks.push((sources.products.as_path(), PRODUCT_KEYS));
    checks.push((sources.stage_order.as_path(), STAGE_KEYS));
    checks.push((sources.calendar.as_path(), NO_KEYS));

    for (path, required) in checks {
        match load_csv(path) {
            Ok(table) => {
                println!("{}: {} rows, {} columns", path.display(), table.len(), table.headers().len());
                if let Err(e) = table.require_columns(&path.display().to_string(), required) {
                    issues.push(e.to_string());
                }
                if path == sources.calendar.as_path()
                    && !table.headers().iter().any(|h| h.eq_ignore_ascii_case(FECHA_GESTION))
                {
                    issues.push(format!("{}: no {} column", path.display(), FECHA_GESTION));
                }
            }
            Err(e) => issues.push(e.to_string()),
        }
    }

    if issues.is_empty() {
        println!("  No issues found");
        Ok(())
    } else {
        println!("  Issues found:");
        for issue in &issues {
            println!("    - {}", issue);
        }
        anyhow::bail!("{} validation issue(s)", issues.len())
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  <dimension>=<value>   filter (fecha, supervisor, gestor, etapa, estrategia, producto, canal)");
    println!("  <dimension>=Todas     clear one filter");
    println!("  hora=8-12             hour range; hora= clears it");
    println!("  view overview|detail|compare");
    println!("  options <dimension>   list values");
    println!("  reset                 clear every filter");
    println!("  quit");
}

/// View redrawn by the interactive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Overview,
    Detail,
    Compare,
}

impl View {
    fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "overview" => Some(View::Overview),
            "detail" => Some(View::Detail),
            "compare" => Some(View::Compare),
            _ => None,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            View::Overview => "overview",
            View::Detail => "detail",
            View::Compare => "compare",
        };
        write!(f, "{}", name)
    }
}

fn interactive(sources: &DataSources, rules: &MetricRules) -> Result<()> {
    let mut cache = PanelCache::new();
    let mut filters = FilterSet::new();
    let mut view = View::Overview;

    print_interactive_help();
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("[{}] {}> ", view, filters);
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        let redraw = match input {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                print_interactive_help();
                false
            }
            "reset" => {
                filters.reset();
                true
            }
            _ if input.starts_with("view ") => {
                let name = input["view ".len()..].trim();
                match View::from_name(name) {
                    Some(v) => {
                        view = v;
                        true
                    }
                    None => {
                        println!("Unknown view: {} (overview, detail, compare)", name);
                        false
                    }
                }
            }
            _ if input.starts_with("options ") => {
                match Dimension::from_name(&input["options ".len()..]) {
                    Some(dimension) => {
                        let table = cache.get_or_load(sources, rules).context("Failed to load gestion data")?;
                        println!("{}", report::filter_options(&table, dimension).join(", "));
                    }
                    None => println!("Unknown dimension"),
                }
                false
            }
            _ => match input.split_once('=') {
                Some((name, value)) if name.trim().eq_ignore_ascii_case("hora") => {
                    if value.trim().is_empty() {
                        filters.set_hours(None);
                        true
                    } else {
                        match HourRange::parse(value) {
                            Ok(range) => {
                                filters.set_hours(Some(range));
                                true
                            }
                            Err(e) => {
                                println!("{}", e);
                                false
                            }
                        }
                    }
                }
                Some((name, value)) => match Dimension::from_name(name) {
                    Some(dimension) => {
                        filters.set(dimension, Choice::parse(value));
                        true
                    }
                    None => {
                        println!("Unknown dimension: {}", name.trim());
                        false
                    }
                },
                None => {
                    println!("Unrecognized command, type 'help'");
                    false
                }
            },
        };

        if redraw {
            // Load errors end the session; view errors only print a warning
            let table = cache.get_or_load(sources, rules).context("Failed to load gestion data")?;
            let rendered = match view {
                View::Overview => report::overview(&table, &filters).map(|v| render::render_overview(&v)),
                View::Detail => report::detail(&table, &filters).map(|v| render::render_detail(&v, 50)),
                View::Compare => report::comparison(&table, &filters).map(|v| render::render_comparison(&v)),
            };
            match rendered {
                Ok(text) => print!("{}", text),
                Err(e) => println!("Warning: {}", e),
            }
        }
    }

    log::debug!("Interactive session ended after {} load(s)", cache.loads());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names() {
        assert_eq!(View::from_name("overview"), Some(View::Overview));
        assert_eq!(View::from_name(" Detail "), Some(View::Detail));
        assert_eq!(View::from_name("compare"), Some(View::Compare));
        assert_eq!(View::from_name("foo"), None);
        assert_eq!(View::Compare.to_string(), "compare");
    }
}
