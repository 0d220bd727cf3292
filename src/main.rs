use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use middleware_injector::assets::{DiskStore, DryRunStore};
use middleware_injector::config::{self, InjectorConfig, CONFIG_ENV_VAR};
use middleware_injector::{Document, FormattingOptions, Injector, LineEnding};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "middleware-injector")]
#[command(about = "Wire Dojo middleware into widget source files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a middleware to a widget file
    Add {
        /// Middleware name (theme, i18n, store, icache, ...)
        capability: String,

        /// Widget source file to edit
        file: PathBuf,

        /// Config file (otherwise discovered from the file's directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List middleware with special handling
    Capabilities {
        /// Config file (otherwise discovered from the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FormatArgs {
    /// Width of one indentation level when indenting with spaces
    #[arg(long)]
    tab_size: Option<usize>,

    /// Indent inserted lines with spaces
    #[arg(long, conflicts_with = "tabs")]
    spaces: bool,

    /// Indent inserted lines with tabs
    #[arg(long)]
    tabs: bool,

    /// Terminate inserted lines with CRLF
    #[arg(long, conflicts_with = "lf")]
    crlf: bool,

    /// Terminate inserted lines with LF
    #[arg(long)]
    lf: bool,
}

impl FormatArgs {
    fn apply(&self, mut options: FormattingOptions) -> FormattingOptions {
        if let Some(tab_size) = self.tab_size {
            options.tab_size = tab_size;
        }
        if self.spaces {
            options.insert_spaces = true;
        }
        if self.tabs {
            options.insert_spaces = false;
        }
        if self.crlf {
            options.line_ending = Some(LineEnding::CrLf);
        }
        if self.lf {
            options.line_ending = Some(LineEnding::Lf);
        }
        options
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            capability,
            file,
            config,
            format,
            dry_run,
            diff,
        } => cmd_add(&capability, &file, config, &format, dry_run, diff),

        Commands::Capabilities { config } => cmd_capabilities(config),
    }
}

/// Resolve the config file using multiple strategies
///
/// Priority order:
/// 1. Explicit --config flag
/// 2. MIDDLEWARE_INJECTOR_CONFIG environment variable
/// 3. Nearest config file in `search_from` or its ancestors
/// 4. Built-in defaults
fn resolve_config(cli_config: Option<PathBuf>, search_from: &Path) -> Result<InjectorConfig> {
    if let Some(path) = cli_config {
        return Ok(config::load_from_path(&path)?);
    }

    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(config::load_from_path(&path)?);
        }
        eprintln!(
            "{}",
            format!("Warning: {CONFIG_ENV_VAR} is set but path doesn't exist: {env_path}")
                .yellow()
        );
    }

    if let Some(path) = config::discover(search_from) {
        tracing::debug!(path = %path.display(), "using discovered config");
        return Ok(config::load_from_path(&path)?);
    }

    Ok(InjectorConfig::default())
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (updated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_add(
    capability: &str,
    file: &Path,
    config: Option<PathBuf>,
    format: &FormatArgs,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    // 1. Load the target snapshot
    let document = Document::from_path(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    // 2. Resolve config and build the injector
    let search_from = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => env::current_dir()?,
    };
    let config = resolve_config(config, &search_from)?;
    let injector = Injector::new(config.registry())?
        .with_module_prefix(config.imports.module_prefix.clone());
    let options = format.apply(config.formatting());

    if !injector.registry().contains(capability) {
        match injector.registry().suggest(capability) {
            Some(known) => tracing::warn!(
                capability,
                suggestion = known,
                "unrecognized middleware, adding it generically"
            ),
            None => tracing::debug!(capability, "no special handling for middleware"),
        }
    }

    // 3. Compute the edit batch; companion files are only planned here
    let mut planned = DryRunStore::default();
    let injection = injector.inject(&document, &options, capability, &mut planned)?;

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    if injection.edits.is_empty() {
        println!(
            "{} {}: no anchors found in {}",
            "⊘".cyan(),
            capability,
            file.display()
        );
    } else {
        // 4. Apply (or preview) the batch
        let updated = if dry_run {
            injection.edits.apply_to_str(document.text())?
        } else {
            injection.edits.apply_to_file(file)?
        };

        let verb = if dry_run { "Would add" } else { "Added" };
        println!(
            "{} {} '{}' to {} ({} edits)",
            "✓".green(),
            verb,
            capability,
            file.display(),
            injection.edits.len()
        );

        if show_diff {
            display_diff(file, document.text(), &updated);
        }
    }

    // 5. Companion files go to disk once the source edit has landed
    if !dry_run {
        planned
            .commit(&mut DiskStore)
            .context("failed to write companion files")?;
    }

    // 6. Report companion files
    for asset in &injection.assets {
        match (asset.created, dry_run) {
            (true, false) => println!("  {} created {}", "+".green(), asset.path.display()),
            (true, true) => println!("  {} would create {}", "+".green(), asset.path.display()),
            (false, _) => println!(
                "  {} {} already exists",
                "⊙".yellow(),
                asset.path.display()
            ),
        }
    }

    Ok(())
}

fn cmd_capabilities(config: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config, &env::current_dir()?)?;
    let registry = config.registry();

    println!("{}", "Middleware with special handling:".bold());
    for capability in registry.iter() {
        let mut notes = Vec::new();
        if capability.symbol != capability.name {
            notes.push(format!("imports {}", capability.symbol));
        }
        if let Some(line) = capability.pre_call_line() {
            notes.push(format!("declares `{line}`"));
        }
        if let Some(asset) = capability.asset {
            notes.push(format!("provisions {asset:?}").to_lowercase());
        }
        if capability.follow_up.is_some() {
            notes.push("adds follow-up line".to_string());
        }
        println!("  - {} ({})", capability.name, notes.join(", ").dimmed());
    }
    println!();
    println!(
        "{}",
        "Any other name is added generically (import + create + middleware).".dimmed()
    );

    Ok(())
}
