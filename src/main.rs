//! Workloop - Autonomous Agent Iteration Loop
//!
//! CLI entry point: drives the iteration loop and exposes the document
//! tooling (validate, convert, status, init) around it.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use workloop::document::WorkDocument;
use workloop::loop_manager::{
    LoopConfig, LoopManager, DEFAULT_DOCUMENT_FILE, DEFAULT_MAX_ITERATIONS, DEFAULT_PROMPT_FILE,
};
use workloop::taskgraph::TaskGraph;
use workloop::validate::validate_str;
use workloop::worker::{
    CommandWorker, WorkerConfig, WorkerKind, DEFAULT_TIMEOUT_SECS, WORKER_CMD_ENV,
};
use workloop::{Result, WorkloopError};

#[derive(Parser)]
#[command(name = "workloop")]
#[command(author = "Workloop Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Autonomous agent iteration loop driven by a work-item plan", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Working directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the iteration loop
    Run {
        /// Maximum iterations (positional, alternative to -n)
        #[arg(value_name = "MAX_ITERATIONS")]
        max_iterations: Option<u32>,

        /// Maximum iterations
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        iterations: u32,

        /// Worker kind: interactive or headless
        #[arg(short, long, value_enum, default_value = "interactive")]
        worker: WorkerKind,

        /// Wall-clock timeout in seconds for the headless worker
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Work-item document file
        #[arg(long, value_name = "FILE", default_value = DEFAULT_DOCUMENT_FILE)]
        document: PathBuf,

        /// Prompt file handed to the worker each iteration
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PROMPT_FILE)]
        prompt: PathBuf,

        /// Ingest an external document into the working directory first
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Override the worker command line (program + args, whitespace
        /// split; the prompt is still piped on stdin)
        #[arg(long, value_name = "CMD", env = WORKER_CMD_ENV)]
        worker_cmd: Option<String>,
    },

    /// Validate the work-item document and report every issue
    Validate {
        /// Work-item document file
        #[arg(long, value_name = "FILE", default_value = DEFAULT_DOCUMENT_FILE)]
        document: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert the document into a dependency-ordered task graph
    Convert {
        /// Work-item document file
        #[arg(long, value_name = "FILE", default_value = DEFAULT_DOCUMENT_FILE)]
        document: PathBuf,

        /// Print the full graph as JSON instead of the count report
        #[arg(long)]
        json: bool,

        /// Write the graph JSON to a file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document completion status
    Status {
        /// Work-item document file
        #[arg(long, value_name = "FILE", default_value = DEFAULT_DOCUMENT_FILE)]
        document: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a template document and prompt file
    Init {
        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "workloop=debug,info"
    } else {
        "workloop=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Resolve working directory
    let work_dir = cli.dir.canonicalize().unwrap_or(cli.dir.clone());
    if !work_dir.is_dir() {
        eprintln!(
            "{} Directory not found: {}",
            "Error:".red().bold(),
            work_dir.display()
        );
        std::process::exit(1);
    }

    let code = match dispatch(cli.command, &work_dir).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn dispatch(command: Commands, work_dir: &Path) -> Result<i32> {
    match command {
        Commands::Run {
            max_iterations,
            iterations,
            worker,
            timeout,
            document,
            prompt,
            plan,
            worker_cmd,
        } => {
            let document_path = resolve(work_dir, &document);
            let prompt_path = resolve(work_dir, &prompt);

            if let Some(plan) = plan {
                ingest_plan(&plan, &document_path)?;
            }

            let worker_config = WorkerConfig::new(worker, timeout).with_override(worker_cmd);
            let command_worker = CommandWorker::new(worker_config);
            // Fatal before any iteration runs
            command_worker.validate()?;

            let label = match worker {
                WorkerKind::Interactive => worker.to_string(),
                WorkerKind::Headless => format!("{} (timeout {}s)", worker, timeout),
            };

            let config = LoopConfig::new(work_dir.to_path_buf())
                .with_document_path(document_path)
                .with_prompt_path(prompt_path)
                .with_max_iterations(max_iterations.unwrap_or(iterations))
                .with_worker_label(label);

            let mut manager = LoopManager::new(config, Box::new(command_worker))?;
            let outcome = manager.run().await?;
            Ok(outcome.exit_code())
        }

        Commands::Validate { document, json } => {
            let path = resolve(work_dir, &document);
            let content = read_document(&path)?;
            let report = validate_str(&content);

            if json {
                let issues: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": report.is_valid(),
                        "issues": issues,
                    }))?
                );
            } else if report.is_valid() {
                println!("{} {}", "OK".green().bold(), report.summary());
            } else {
                eprintln!("{} {}", "Invalid:".red().bold(), report.summary());
                for issue in &report.issues {
                    eprintln!("  {} {}", "-".red(), issue);
                }
            }

            if report.is_valid() {
                Ok(0)
            } else {
                Ok(WorkloopError::Validation {
                    issues: report.issues,
                }
                .exit_code())
            }
        }

        Commands::Convert {
            document,
            json,
            output,
        } => {
            let path = resolve(work_dir, &document);
            let content = read_document(&path)?;

            // Conversion is only defined for valid documents; refuse with
            // the complete issue list rather than emit a partial graph.
            let report = validate_str(&content);
            if !report.is_valid() {
                eprintln!("{} {}", "Invalid:".red().bold(), report.summary());
                for issue in &report.issues {
                    eprintln!("  {} {}", "-".red(), issue);
                }
                return Err(WorkloopError::Validation {
                    issues: report.issues,
                });
            }

            let doc = WorkDocument::from_json(&content)?;
            let graph = TaskGraph::from_document(&doc);
            let counts = graph.report();

            if let Some(output) = output {
                let path = resolve(work_dir, &output);
                std::fs::write(&path, serde_json::to_string_pretty(&graph)?)?;
                println!("{} {}", "Wrote".green(), path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&graph)?);
            } else {
                println!(
                    "{} {} parent task(s), {} child task(s), {} dependency edge(s)",
                    "Converted:".green().bold(),
                    counts.parent_tasks,
                    counts.child_tasks,
                    counts.dependency_edges
                );
            }
            Ok(0)
        }

        Commands::Status { document, json } => {
            let path = resolve(work_dir, &document);
            let doc = WorkDocument::load(&path)?;
            let status = doc.status();

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{} {}", "Project:".blue().bold(), status.project);
                println!(
                    "   {} of {} stories passing ({}%)",
                    status.completed_stories, status.total_stories, status.completion_percentage
                );
                if !status.incomplete_stories.is_empty() {
                    println!("   Next up:");
                    for story in &status.incomplete_stories {
                        println!("     {} {} - {}", "·".yellow(), story.id, story.title);
                    }
                }
            }
            Ok(0)
        }

        Commands::Init { force } => init_workspace(work_dir, force),
    }
}

/// Resolve a possibly-relative file argument against the working directory.
fn resolve(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|_| WorkloopError::MissingFile {
        path: path.to_path_buf(),
    })
}

/// Copy an external document into place before the loop starts.
fn ingest_plan(source: &Path, document_path: &Path) -> Result<()> {
    if !source.exists() {
        return Err(WorkloopError::MissingFile {
            path: source.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(source)?;
    std::fs::write(document_path, content)?;
    println!(
        "{} Ingested {} into {}",
        "Info:".blue(),
        source.display(),
        document_path.display()
    );
    Ok(())
}

const DOCUMENT_TEMPLATE: &str = r#"{
  "project": "MyProject",
  "branchName": "workloop/my-feature",
  "description": "Description of your feature",
  "userStories": [
    {
      "id": "US-001",
      "title": "First user story",
      "description": "As a user, I want X so that Y",
      "acceptanceCriteria": [
        "Criterion 1",
        "Typecheck passes"
      ],
      "priority": 1,
      "passes": false,
      "notes": ""
    }
  ]
}
"#;

const PROMPT_TEMPLATE: &str = "\
# Iteration Prompt

Read the work-item document and pick the highest-priority story whose
`passes` field is still false. Implement it, verify every acceptance
criterion, then set `passes` to true and note what you did in `notes`.
Append a short summary of the work to progress.txt.

When every story passes, output exactly:

<promise>COMPLETE</promise>
";

/// Write the template document and prompt file.
fn init_workspace(work_dir: &Path, force: bool) -> Result<i32> {
    let mut created = Vec::new();

    for (name, contents) in [
        (DEFAULT_DOCUMENT_FILE, DOCUMENT_TEMPLATE),
        (DEFAULT_PROMPT_FILE, PROMPT_TEMPLATE),
    ] {
        let path = work_dir.join(name);
        if path.exists() && !force {
            println!(
                "{} {} already exists (use --force to overwrite)",
                "Warning:".yellow(),
                path.display()
            );
            continue;
        }
        std::fs::write(&path, contents)?;
        created.push(path);
    }

    for path in &created {
        println!("{} {}", "Created".green(), path.display());
    }
    if !created.is_empty() {
        println!();
        println!("Next steps:");
        println!("  1. Edit {} with your user stories", DEFAULT_DOCUMENT_FILE);
        println!("  2. Run 'workloop run' to start the loop");
    }
    Ok(0)
}
