use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use matrec::{build_state, AppConfig, AttributeValue, EncoderBundle, FitOptions, Query, RankResponse, RestApi, Strategy};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Rank construction materials against a desired attribute profile
#[derive(Parser, Debug)]
#[command(name = "matrec")]
#[command(about = "Construction-material recommendation engine", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the catalog CSVs (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the REST API
    Serve {
        /// HTTP API port (overrides the config file)
        #[arg(long)]
        http_port: Option<u16>,
    },
    /// Rank one catalog and print the result
    Rank(RankArgs),
    /// List configured catalogs
    Catalogs,
    /// Fit an encoder on a catalog and write the artifact
    BuildArtifact {
        catalog: String,
        out: PathBuf,
        /// Leave material type out of the encoding
        #[arg(long)]
        no_material_type: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct RankArgs {
    catalog: String,
    #[arg(long)]
    strength: String,
    #[arg(long)]
    cost: String,
    #[arg(long)]
    water_resistance: String,
    #[arg(long)]
    durability: String,
    /// Only rank rows of this material type
    #[arg(long)]
    material_type: Option<String>,
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// level (manual) or cosine (vector)
    #[arg(short, long)]
    strategy: Option<String>,
    /// Print the full response as JSON
    #[arg(long)]
    json: bool,
}

impl RankArgs {
    fn query(&self) -> Query {
        let query = Query::from_levels(
            AttributeValue::parse_cell(&self.strength),
            AttributeValue::parse_cell(&self.cost),
            AttributeValue::parse_cell(&self.water_resistance),
            AttributeValue::parse_cell(&self.durability),
        );
        match &self.material_type {
            Some(material_type) => query.with_material_type(material_type.as_str()),
            None => query,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    match args.command {
        Command::Serve { http_port } => {
            if let Some(port) = http_port {
                config.http_port = port;
            }
            serve(config).await
        }
        Command::Rank(rank_args) => rank(&config, &rank_args),
        Command::Catalogs => catalogs(&config),
        Command::BuildArtifact {
            catalog,
            out,
            no_material_type,
        } => build_artifact(&config, &catalog, out, no_material_type),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting matrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);
    info!("HTTP API port: {}", config.http_port);

    let state = build_state(&config).context("building engine")?;
    for (id, e) in state.store.preload() {
        warn!(catalog = %id, error = %e, "catalog unavailable until its source is fixed");
    }

    let http_port = config.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn rank(config: &AppConfig, args: &RankArgs) -> anyhow::Result<()> {
    let state = build_state(config).context("building engine")?;
    let strategy = args.strategy.as_deref().map(str::parse::<Strategy>).transpose()?;

    let response = state
        .rank(&args.catalog, &args.query(), args.top_k, strategy)
        .with_context(|| format!("ranking catalog '{}'", args.catalog))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_table(&response);
    }
    Ok(())
}

fn print_table(response: &RankResponse) {
    if response.is_empty() {
        println!("No matching {} products.", response.catalog);
        return;
    }

    println!("{} ({} strategy, {} candidates)", response.catalog, response.strategy, response.stats.candidates_count);
    for row in &response.result {
        println!("{:>3}. {:<40} {:>8.3}  {}", row.rank, row.name, row.score, row.application);
        if !row.eco_friendly.is_empty() {
            println!("     eco-friendly: {}", row.eco_friendly);
        }
        for (column, value) in &row.extra {
            println!("     {}: {}", column, value);
        }
    }
}

fn catalogs(config: &AppConfig) -> anyhow::Result<()> {
    let store = config.catalog_store();
    for id in store.ids() {
        let source = store
            .source(&id)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match store.get(&id) {
            Ok(catalog) => println!(
                "{:<12} {:>5} rows  {}  [{}]",
                id,
                catalog.len(),
                source,
                catalog.material_types().join(", ")
            ),
            Err(e) => println!("{:<12} unavailable ({})", id, e),
        }
    }
    Ok(())
}

fn build_artifact(config: &AppConfig, catalog_id: &str, out: PathBuf, no_material_type: bool) -> anyhow::Result<()> {
    let store = config.catalog_store();
    let catalog = store
        .get(catalog_id)
        .with_context(|| format!("loading catalog '{}'", catalog_id))?;

    let options = FitOptions {
        include_material_type: !no_material_type,
    };
    let bundle = EncoderBundle::fit(&catalog, options).context("fitting encoder")?;
    let artifact = bundle
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;

    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}
