//! qucs-cli - inspect Qucs schematic documents and projects from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qucs_core::{probe_port_count, scan_project, Document, DocumentSet, Settings};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "qucs-cli")]
#[command(about = "Qucs schematic document inspection tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a schematic file
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Load schematics and report the ones that fail
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List the files of a project directory
    Project {
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Count the subcircuit ports a schematic defines
    Ports {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Bring every placement of a subcircuit in a project up to its
    /// current port count
    Sync {
        /// Subcircuit schematic
        #[arg(value_name = "SUBCIRCUIT")]
        subcircuit: PathBuf,

        /// Project directory, defaults to the subcircuit's directory
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Info { file, format } => handle_info(&file, &format, settings),
        Commands::Check { files, format } => Ok(handle_check(&files, &format, settings)),
        Commands::Project { dir, format } => handle_project(&dir, &format, &settings),
        Commands::Ports { file } => handle_ports(&file, &settings),
        Commands::Sync {
            subcircuit,
            dir,
            format,
        } => handle_sync(&subcircuit, dir.as_deref(), &format, settings),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to read settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn handle_info(file: &Path, format: &OutputFormat, settings: Settings) -> Result<i32> {
    let doc = Document::open(file, Arc::new(settings))
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let schematic = doc.schematic();
    let subcircuits: Vec<_> = schematic
        .components()
        .iter()
        .filter(|c| c.is_subcircuit())
        .map(|c| {
            serde_json::json!({
                "name": c.name,
                "file": c.file_reference(),
                "ports": c.port_count(),
            })
        })
        .collect();

    match format {
        OutputFormat::Human => {
            println!("File: {}", file.display());
            println!("{}", "─".repeat(60));
            println!("  Version:    {}", doc.version());
            println!("  Components: {}", schematic.components().len());
            println!("  Wires:      {}", schematic.wires().len());
            println!("  Labels:     {}", schematic.labels().len());
            println!("  Diagrams:   {}", schematic.diagrams().len());
            println!("  Ports:      {}", schematic.port_count());
            if let Some(data_set) = doc.data_set_path() {
                println!("  Dataset:    {}", data_set.display());
            }
            for sub in &subcircuits {
                println!(
                    "  Subcircuit {} -> {} ({} ports)",
                    sub["name"].as_str().unwrap_or_default(),
                    sub["file"].as_str().unwrap_or("?"),
                    sub["ports"]
                );
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "version": doc.version(),
            "components": schematic.components().len(),
            "wires": schematic.wires().len(),
            "labels": schematic.labels().len(),
            "diagrams": schematic.diagrams().len(),
            "paintings": schematic.paintings().len(),
            "ports": schematic.port_count(),
            "symbol_paintings": doc.symbol().paintings().len(),
            "subcircuits": subcircuits,
        })),
    }
    Ok(0)
}

fn handle_check(files: &[PathBuf], format: &OutputFormat, settings: Settings) -> i32 {
    let settings = Arc::new(settings);
    let results: Vec<(&PathBuf, Option<String>)> = files
        .iter()
        .map(|file| {
            let error = Document::open(file, settings.clone())
                .err()
                .map(|e| e.to_string());
            (file, error)
        })
        .collect();
    let failed = results.iter().filter(|(_, e)| e.is_some()).count();

    match format {
        OutputFormat::Human => {
            for (file, error) in &results {
                match error {
                    None => println!("  OK    {}", file.display()),
                    Some(e) => println!("  FAIL  {}: {}", file.display(), e),
                }
            }
            println!("\n  {} of {} files loaded", results.len() - failed, results.len());
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "results": results.iter().map(|(file, error)| {
                serde_json::json!({
                    "file": file.display().to_string(),
                    "ok": error.is_none(),
                    "error": error,
                })
            }).collect::<Vec<_>>(),
            "failed": failed,
        })),
    }

    if failed > 0 {
        1
    } else {
        0
    }
}

fn handle_project(dir: &Path, format: &OutputFormat, settings: &Settings) -> Result<i32> {
    let contents = scan_project(dir, &settings.version)
        .with_context(|| format!("Failed to read project {}", dir.display()))?;

    match format {
        OutputFormat::Human => {
            println!("Project: {}", dir.display());
            println!("{}", "─".repeat(60));
            let groups = [
                ("Schematics", &contents.schematics),
                ("Data displays", &contents.data_displays),
                ("Datasets", &contents.datasets),
                ("Others", &contents.others),
            ];
            for (title, files) in groups {
                if files.is_empty() {
                    continue;
                }
                println!("\n  {}:", title);
                for file in files {
                    let name = file.path.file_name().unwrap_or_default().to_string_lossy();
                    match file.port_count {
                        Some(ports) if ports > 0 => println!("    - {} ({} ports)", name, ports),
                        _ => println!("    - {}", name),
                    }
                }
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!(contents)),
    }
    Ok(0)
}

fn handle_ports(file: &Path, settings: &Settings) -> Result<i32> {
    let ports = probe_port_count(file, &settings.version)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("{}", ports);
    Ok(0)
}

/// Open every schematic of the project, rebuild the placements of
/// `subcircuit` for its port count and list them.
fn handle_sync(
    subcircuit: &Path,
    dir: Option<&Path>,
    format: &OutputFormat,
    settings: Settings,
) -> Result<i32> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => subcircuit
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };
    let contents = scan_project(&dir, &settings.version)
        .with_context(|| format!("Failed to read project {}", dir.display()))?;

    let ports = probe_port_count(subcircuit, &settings.version)
        .with_context(|| format!("Failed to read {}", subcircuit.display()))?;

    let mut set = DocumentSet::new(settings);
    for file in &contents.schematics {
        if let Err(e) = set.open(&file.path) {
            tracing::warn!("Skipping {}: {}", file.path.display(), e);
        }
    }
    let rebuilt = set.sync_ports(subcircuit, ports);

    let mut refs = Vec::new();
    for doc in set.documents() {
        let graph = doc.schematic();
        for id in graph.find_by_file_reference(subcircuit) {
            if let Some(component) = graph.component(id) {
                refs.push((doc.name(), component.name.clone(), component.port_count()));
            }
        }
    }

    match format {
        OutputFormat::Human => {
            for (document, name, ports) in &refs {
                println!("  {} in {} ({} ports)", name, document, ports);
            }
            println!("\n  {} placements, {} rebuilt for {} ports", refs.len(), rebuilt, ports);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "subcircuit": subcircuit.display().to_string(),
            "ports": ports,
            "rebuilt": rebuilt,
            "placements": refs.iter().map(|(document, name, ports)| {
                serde_json::json!({
                    "document": document,
                    "component": name,
                    "ports": ports,
                })
            }).collect::<Vec<_>>(),
        })),
    }
    Ok(0)
}
