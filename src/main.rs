use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use glud::config::{load_from_path, Ancestry, Category, Metadata, QueryConfig, QueryExpr, Step};
use glud::cpp::{CppParser, Cursor, ParseOptions, TranslationUnit};
use glud::node::{AccessSpecifier, CursorKind, Node};
use glud::{dump, walk};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

/// File extensions searched when a directory is given.
const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"];

#[derive(Parser)]
#[command(name = "glud")]
#[command(about = "Query C++ sources with composable predicates", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); GLUD_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every cursor matching a query
    Find(FindArgs),

    /// Print the cursor tree of a file
    Dump {
        file: PathBuf,

        /// Include macro definitions and inclusion directives
        #[arg(long)]
        detailed: bool,
    },

    /// List cursor kinds and query categories
    Kinds,
}

#[derive(Args)]
struct FindArgs {
    /// Source files or directories (searched recursively)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML query file
    #[arg(short, long)]
    query: Option<PathBuf>,

    /// Node category, e.g. class_definition or method (repeatable)
    #[arg(long = "is", value_name = "CATEGORY")]
    categories: Vec<Category>,

    /// Cursor kind, e.g. cxx_method
    #[arg(long)]
    kind: Option<CursorKind>,

    /// Regular expression matched against the whole spelling
    #[arg(long, value_name = "REGEX")]
    name: Option<String>,

    /// Fully qualified type spelling, e.g. ns::Foo
    #[arg(long, value_name = "TYPE")]
    typename: Option<String>,

    /// Access level: public, protected, private or none
    #[arg(long)]
    access: Option<AccessSpecifier>,

    /// Only cursors with a semantic ancestor whose spelling matches NAME
    #[arg(long, value_name = "NAME")]
    within: Option<String>,

    /// Include macro definitions and inclusion directives
    #[arg(long)]
    detailed: bool,

    /// Print one JSON object per match
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Find(args) => {
            if !cmd_find(&args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Dump { file, detailed } => cmd_dump(&file, detailed),
        Commands::Kinds => {
            cmd_kinds();
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "glud=info",
        _ => "glud=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("GLUD_LOG")
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Combine the query file (if any) with the command-line filters.
fn build_query(args: &FindArgs) -> Result<QueryConfig> {
    let mut config = match &args.query {
        Some(path) => load_from_path(path)?,
        None => QueryConfig {
            meta: Metadata::default(),
            parse: ParseOptions::default(),
            query: QueryExpr::All(Vec::new()),
        },
    };

    let mut filters: Vec<QueryExpr> = args.categories.iter().copied().map(QueryExpr::Is).collect();
    if let Some(kind) = args.kind {
        filters.push(QueryExpr::Kind(kind));
    }
    if let Some(name) = &args.name {
        filters.push(QueryExpr::Name(name.clone()));
    }
    if let Some(typename) = &args.typename {
        filters.push(QueryExpr::Typename(typename.clone()));
    }
    if let Some(access) = args.access {
        filters.push(QueryExpr::Access(access));
    }
    if let Some(within) = &args.within {
        filters.push(QueryExpr::AnyPredecessor(Ancestry {
            step: Step::SemanticParent,
            matches: Box::new(QueryExpr::Name(within.clone())),
        }));
    }

    if args.query.is_none() && filters.is_empty() {
        anyhow::bail!(
            "{}\n{}",
            "No query given.".red(),
            "Pass --query FILE or at least one filter such as --is class".bold()
        );
    }
    if !filters.is_empty() {
        if args.query.is_some() {
            filters.insert(0, config.query);
        }
        config.query = QueryExpr::All(filters);
    }
    if args.detailed {
        config.parse.detailed_preprocessing_record = true;
    }
    config.validate()?;
    Ok(config)
}

/// Expand directories into the C/C++ sources below them. Explicit files are
/// taken as given.
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            anyhow::bail!("{} does not exist", path.display());
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_source(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    Ok(files)
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn cmd_find(args: &FindArgs) -> Result<bool> {
    let config = build_query(args)?;
    let files = collect_sources(&args.paths)?;
    let mut parser = CppParser::with_options(config.parse)?;

    let units = files
        .iter()
        .map(|file| parser.parse_file(file))
        .collect::<Result<Vec<_>, _>>()?;
    let predicate = config.query.compile::<Cursor<'_>>()?;

    let mut total = 0usize;
    for unit in &units {
        for diagnostic in unit.diagnostics() {
            tracing::info!(%diagnostic, "syntax error");
        }
        for cursor in walk(&predicate, unit.cursor()) {
            if args.json {
                println!("{}", serde_json::to_string(&MatchRecord::new(unit, &cursor))?);
            } else {
                println!("{}", format_match(unit, &cursor));
            }
            total += 1;
        }
    }

    tracing::info!(files = files.len(), matches = total, "search finished");
    if total == 0 && !args.json {
        eprintln!("{}", "No matches.".yellow());
    }
    Ok(total > 0)
}

/// `file:line:col KIND displayname [type]`
fn format_match(unit: &TranslationUnit, cursor: &Cursor<'_>) -> String {
    let position = match cursor.location() {
        Some(location) => location.to_string(),
        None => unit.path().display().to_string(),
    };
    let name = if cursor.displayname().is_empty() {
        cursor.spelling()
    } else {
        cursor.displayname()
    };
    let mut line = format!(
        "{} {} {}",
        position.dimmed(),
        cursor.kind().to_string().cyan(),
        name.bold()
    );
    if let Some(ty) = cursor.ty() {
        line.push_str(&format!(" [{}]", ty.spelling.green()));
    }
    line
}

#[derive(Serialize)]
struct MatchRecord {
    file: String,
    line: Option<usize>,
    column: Option<usize>,
    kind: CursorKind,
    spelling: String,
    displayname: String,
    qualified_name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    access: AccessSpecifier,
    is_definition: bool,
}

impl MatchRecord {
    fn new(unit: &TranslationUnit, cursor: &Cursor<'_>) -> Self {
        let location = cursor.location();
        Self {
            file: location.map_or_else(
                || unit.path().display().to_string(),
                |location| location.file.display().to_string(),
            ),
            line: location.map(|location| location.line),
            column: location.map(|location| location.column),
            kind: cursor.kind(),
            spelling: cursor.spelling().to_string(),
            displayname: cursor.displayname().to_string(),
            qualified_name: cursor.qualified_name().to_string(),
            ty: cursor.ty().map(|ty| ty.spelling.clone()),
            access: cursor.access(),
            is_definition: cursor.is_definition(),
        }
    }
}

fn cmd_dump(file: &Path, detailed: bool) -> Result<()> {
    let mut parser = CppParser::with_options(ParseOptions {
        detailed_preprocessing_record: detailed,
        ..ParseOptions::default()
    })?;
    let unit = parser.parse_file(file)?;
    print!("{}", dump(&unit.cursor()));
    for diagnostic in unit.diagnostics() {
        eprintln!("{} {}", "warning:".yellow(), diagnostic);
    }
    Ok(())
}

fn cmd_kinds() {
    println!("{}", "Categories (--is):".bold());
    for category in Category::ALL {
        println!("  {category}");
    }
    println!("{}", "Cursor kinds (--kind):".bold());
    for kind in CursorKind::ALL {
        println!("  {}", kind.name());
    }
}
