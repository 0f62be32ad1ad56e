use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lpform_client::{
    ActionControl, ClientConfig, ExportCoordinator, FileDeliveryHost, FileStore,
    HttpSolverService, Message, Outcome, PersistenceStore, SolveOrchestrator,
};
use lpform_form::{FormState, build_request, diagnostics, present, present_tableaux};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_FILE: &str = "lpform.toml";

#[derive(Parser)]
#[command(name = "lpform")]
#[command(about = "Build linear programs and solve them with a simplex service", long_about = None)]
struct Cli {
    /// Config file (defaults to ./lpform.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Override the solver base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override the session storage directory
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default form file
    Init {
        /// The file to create
        #[arg(default_value = "problem.json")]
        file: PathBuf,
        /// Number of decision variables
        #[arg(short = 'n', long, default_value_t = 2)]
        variables: usize,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check a form file for errors
    Check {
        /// The form file to check
        file: PathBuf,
    },
    /// Solve a form file (or the last submitted problem)
    Solve {
        /// The form file to solve
        file: Option<PathBuf>,
    },
    /// Print the form restored from the last submitted problem
    Restore {
        /// Write the form here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show the last optimal result
    Show {
        /// Also print the simplex tableaux
        #[arg(short, long)]
        tableaux: bool,
    },
    /// Fetch the graph of a two-variable problem
    Graph {
        /// Where to write the HTML document
        #[arg(short, long, default_value = "graph.html")]
        out: PathBuf,
    },
    /// Fetch the PDF report
    Report {
        /// Directory to save the report into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    info!(
        base_url = config.base_url,
        storage_dir = %config.storage_dir.display(),
        "Loaded configuration"
    );

    match cli.command {
        Commands::Init {
            file,
            variables,
            force,
        } => {
            if variables == 0 {
                bail!("the number of variables must be at least 1");
            }
            if file.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", file.display());
            }
            write_form(&file, &FormState::with_variables(variables))?;
            println!("Wrote {} ({} variables)", file.display(), variables);
        }
        Commands::Check { file } => {
            let form = read_form(&file)?;
            let fields = form.fields();
            let mut problems: Vec<String> =
                diagnostics(&fields).iter().map(ToString::to_string).collect();
            let request = if problems.is_empty() {
                build_request(&fields)
                    .inspect_err(|e| problems.push(e.to_string()))
                    .ok()
            } else {
                None
            };

            match request {
                Some(request) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {}", request.direction().label());
                    println!("  {} variables", request.num_variables());
                    println!("  {} constraints", request.num_constraints());
                }
                None => {
                    eprintln!("✗ {} has errors:", file.display());
                    for problem in &problems {
                        eprintln!("  {}", problem);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Solve { file } => {
            let mut orchestrator = open_session(&config);
            if let Some(file) = file {
                orchestrator.replace_form(read_form(&file)?);
            }
            let service = HttpSolverService::new(&config).context("Failed to create HTTP client")?;

            match orchestrator.solve(&service).await {
                Outcome::Presented(model) => {
                    print!("{}", model);
                    println!();
                    if model.actions.view_tableaux {
                        println!("Tableaux: lpform show --tableaux");
                    }
                    if model.actions.export_graph {
                        println!("Graph:    lpform graph");
                    }
                    if model.actions.export_report {
                        println!("Report:   lpform report");
                    }
                }
                Outcome::Rejected(e) => bail!("{}", e),
                Outcome::Failed(e) => {
                    return Err(e).context("Could not solve the problem (rerun with -v for details)");
                }
                Outcome::Superseded => debug!("Response superseded"),
            }
        }
        Commands::Restore { out } => {
            let orchestrator = open_session(&config);
            match out {
                Some(path) => {
                    write_form(&path, orchestrator.form())?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(orchestrator.form())?),
            }
        }
        Commands::Show { tableaux } => {
            let store = PersistenceStore::new(FileStore::new(&config.storage_dir));
            let Some(result) = store.read_solve_result() else {
                println!("No stored result");
                return Ok(());
            };
            print!("{}", present(&result, store.read_request().as_ref()));
            if tableaux {
                for table in present_tableaux(&result) {
                    println!();
                    print!("{}", table);
                }
            }
        }
        Commands::Graph { out } => {
            let orchestrator = open_session(&config);
            let service = HttpSolverService::new(&config).context("Failed to create HTTP client")?;
            let html = ExportCoordinator::from_config(&config)
                .export_graph(&service, &orchestrator)
                .await?;
            std::fs::write(&out, html)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Graph written to {}", out.display());
        }
        Commands::Report { out_dir } => {
            let orchestrator = open_session(&config);
            let service = HttpSolverService::new(&config).context("Failed to create HTTP client")?;
            let mut host = FileDeliveryHost::new(&out_dir).context("Failed to prepare staging")?;
            let mut control = ActionControl::new("Export PDF");

            let result = ExportCoordinator::from_config(&config)
                .export_report(&service, &mut host, &orchestrator, &mut control)
                .await;

            // the inline error and the alert carry the same text on a terminal
            for message in host.messages() {
                match message {
                    Message::Notice(text) => println!("{}", text),
                    Message::Alert(text) => eprintln!("{}", text),
                    Message::Error(_) => {}
                }
            }
            if result.is_err() {
                std::process::exit(1);
            }
            for path in host.delivered() {
                println!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => ClientConfig::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config file: {}", DEFAULT_CONFIG_FILE))?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
    Ok(config)
}

fn open_session(config: &ClientConfig) -> SolveOrchestrator<FileStore> {
    SolveOrchestrator::new(PersistenceStore::new(FileStore::new(&config.storage_dir)))
}

fn read_form(path: &Path) -> Result<FormState> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading file: {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("{} is not a valid form file", path.display()))
}

fn write_form(path: &Path, form: &FormState) -> Result<()> {
    let json = serde_json::to_string_pretty(form)?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))
}
