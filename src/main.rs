use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use ecocentros::aggregate::Aggregate;
use ecocentros::config::Config;
use ecocentros::export;
use ecocentros::filter::{FilterSelection, FilteredView};
use ecocentros::logging;
use ecocentros::projection::{self, format_currency};
use ecocentros::schema::{self, ColumnMap, Dataset};
use ecocentros::source::{SourceKind, SourceLoader};

#[derive(Parser)]
#[command(name = "ecocentros")]
#[command(about = "Montevideo ecocentros waste-collection data pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Load from a local CSV file instead of the open-data catalog
    #[arg(long)]
    from_file: Option<PathBuf>,
    /// Skip the network entirely and use the bundled sample
    #[arg(long)]
    offline: bool,
}

#[derive(Args)]
struct FilterArgs {
    /// Ecocentro to filter by ("Todos" or omitted = all)
    #[arg(long)]
    site: Option<String>,
    /// Material to filter by ("Todos" or omitted = all)
    #[arg(long)]
    material: Option<String>,
    /// Year to filter by
    #[arg(long)]
    year: Option<i32>,
}

impl FilterArgs {
    fn into_selection(self) -> FilterSelection {
        // "Todos"/"All" on the command line means the same as omitting
        let strip_all = |v: Option<String>| v.filter(|s| s != "Todos" && s != "All");
        FilterSelection {
            site: strip_all(self.site),
            material: strip_all(self.material),
            year: self.year,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and print KPIs and the grouped views
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Emit the whole bundle as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered rows to a CSV file
    Export {
        /// Destination path
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Project an inflation-adjusted budget over a period of years
    Projection {
        /// Current budget, in $
        #[arg(long)]
        budget: f64,
        /// Projected annual inflation, in percent
        #[arg(long)]
        rate: f64,
        /// Period length, in years
        #[arg(long)]
        years: u32,
        /// Also write the table to a CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn build_sources(config: &Config, args: &SourceArgs) -> Vec<SourceKind> {
    let mut sources = Vec::new();
    if !args.offline {
        match &args.from_file {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => sources.push(SourceKind::UploadedBytes {
                    name: path.display().to_string(),
                    bytes,
                }),
                Err(e) => {
                    warn!("Could not read '{}': {}", path.display(), e);
                    println!("⚠️  Could not read {}: {} — falling back", path.display(), e);
                }
            },
            None => sources.push(SourceKind::RemoteUrl(config.data_url.clone())),
        }
    }
    sources.push(SourceKind::Sample);
    sources
}

async fn load_dataset(config: &Config, args: &SourceArgs) -> anyhow::Result<Dataset> {
    let loader = SourceLoader::from_config(config);
    let sources = build_sources(config, args);
    let raw = loader.load(&sources).await?;
    let dataset = schema::normalize(&raw, &ColumnMap::default())?;
    if dataset.skipped_count > 0 {
        warn!(skipped = dataset.skipped_count, "rows excluded during normalization");
    }
    info!(rows = dataset.len(), sites = dataset.sites.len(), "dataset ready");
    Ok(dataset)
}

fn print_summary(dataset: &Dataset, view: &FilteredView<'_>, aggregate: &Aggregate) {
    println!("\n📊 Indicadores Clave");
    println!("   Total recolectado:        {:.0} kg", aggregate.total_kg);
    println!("   Promedio mensual:         {:.0} kg", aggregate.monthly_average_kg);
    println!("   Residuo más recolectado:  {}", aggregate.top_material_label());
    println!("   Ecocentro más activo:     {}", aggregate.top_site_label());

    if view.is_empty() {
        println!("\nNo hay datos que coincidan con los filtros seleccionados.");
    }

    if !aggregate.by_period.is_empty() {
        println!("\nEvolución mensual:");
        for point in &aggregate.by_period {
            println!("   {:<20} {:>12.0} kg", point.period, point.kg);
        }
    }

    if !aggregate.by_material_top_n.is_empty() {
        println!("\nTop residuos:");
        for entry in &aggregate.by_material_top_n {
            println!("   {:<20} {:>12.0} kg", entry.label, entry.kg);
        }
    }

    if !aggregate.by_site.is_empty() {
        println!("\nComparación entre ecocentros:");
        for share in &aggregate.by_site {
            println!(
                "   {:<20} {:>12.0} kg  ({:.1}%)",
                share.site, share.kg, share.pct_of_total
            );
        }
    }

    if !aggregate.by_year.is_empty() {
        println!("\nComparación anual:");
        for entry in &aggregate.by_year {
            println!("   {:<20} {:>12.0} kg", entry.year, entry.kg);
        }
    }

    println!(
        "\nMostrando {} de {} registros ({} filas descartadas en la carga)",
        view.len(),
        dataset.len(),
        dataset.skipped_count
    );
}

fn print_projection(projection: &projection::Projection) {
    println!("\n📈 Presupuesto ajustado por inflación");
    println!(
        "   {:<10} {:>16} {:>16} {:>12}",
        "Período", "Presupuesto", "Incremento", "Poder Adq."
    );
    for row in &projection.rows {
        println!(
            "   {:<10} {:>16} {:>16} {:>11.2}%",
            row.label,
            format_currency(row.budget),
            format_currency(row.increment),
            row.purchasing_power_pct
        );
    }
    println!("\n   Presupuesto final ajustado:   {}", format_currency(projection.final_budget));
    println!("   Incremento total necesario:   {}", format_currency(projection.total_increment));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default();

    match cli.command {
        Commands::Summary { source, filters, json } => {
            let dataset = load_dataset(&config, &source).await?;
            let selection = filters.into_selection();
            let view = selection.apply(&dataset);
            let aggregate = Aggregate::compute(&view, config.top_n);

            if json {
                let bundle = serde_json::json!({
                    "aggregate": aggregate,
                    "sites": dataset.sites,
                    "materials": dataset.materials,
                    "years": dataset.years,
                    "capabilities": dataset.capabilities,
                    "skipped_count": dataset.skipped_count,
                    "matched_rows": view.len(),
                    "total_rows": dataset.len(),
                });
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                print_summary(&dataset, &view, &aggregate);
            }
        }
        Commands::Export { output, source, filters } => {
            let dataset = load_dataset(&config, &source).await?;
            let selection = filters.into_selection();
            let view = selection.apply(&dataset);
            export::write_view_file(&view, &output)?;
            println!("✅ {} filas exportadas a {}", view.len(), output.display());
        }
        Commands::Projection { budget, rate, years, output } => {
            let projection = projection::project(budget, rate, years);
            print_projection(&projection);
            if let Some(path) = output {
                std::fs::write(&path, projection::projection_to_csv(&projection)?)?;
                println!("\n✅ Tabla exportada a {}", path.display());
            }
        }
    }
    Ok(())
}
