use anyhow::{bail, Context};
use boristype_core::config::{CliOverrides, CompilerConfig, CONFIG_FILE_NAME};
use boristype_core::di::{Container, EmittedFile, SourceFile};
use clap::Parser;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// BorisType - compiles modern JavaScript and TypeScript down to BorisScript
#[derive(Parser, Debug, Clone)]
#[command(name = "btc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input files or directories to compile
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to btconfig.json configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Output directory for compiled files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Directory whose layout the output tree mirrors
    #[arg(long, value_name = "DIR")]
    root_dir: Option<PathBuf>,

    /// Initialize a new BorisType project
    #[arg(long)]
    init: bool,

    /// Write non-ASCII characters in strings as \uXXXX escapes
    #[arg(long)]
    escape_non_ascii: bool,

    /// Copy matched files that are not scripts to the output directory
    #[arg(long)]
    include_non_ts_files: bool,

    /// Do not prefix output files with a byte-order mark
    #[arg(long)]
    no_bom: bool,

    /// Stop compiling remaining files after the first failure
    #[arg(long)]
    abort_on_error: bool,

    /// Print diagnostics as plain text, without terminal styling
    #[arg(long)]
    no_pretty: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    show_config: bool,
}

/// Files found for a build, split by whether they get compiled
#[derive(Debug, Default)]
struct Inputs {
    scripts: Vec<PathBuf>,
    assets: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for per-file and per-pass logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    if cli.init {
        return init_project();
    }

    let config = load_config(&cli)?;

    if cli.show_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    config.validate_for_build()?;

    let copy_assets = config.compiler_options.include_non_ts_files;
    let inputs = collect_inputs(&cli, &config)?;
    if inputs.scripts.is_empty() && (!copy_assets || inputs.assets.is_empty()) {
        bail!("No input files found. Pass files on the command line or set `include` in {}.", CONFIG_FILE_NAME);
    }

    let out_dir = PathBuf::from(config.compiler_options.out_dir.clone().unwrap_or_default());
    let root_dir = match &config.compiler_options.root_dir {
        Some(dir) => fs::canonicalize(dir).with_context(|| format!("rootDir `{}` does not exist", dir))?,
        None => {
            let assets: &[PathBuf] = if copy_assets { &inputs.assets } else { &[] };
            common_root(inputs.scripts.iter().chain(assets))
        }
    };

    info!("Input files: {} file(s)", inputs.scripts.len());
    info!("Output directory: {}", out_dir.display());
    debug!("Root directory: {}", root_dir.display());

    let sources = inputs
        .scripts
        .par_iter()
        .map(|path| -> anyhow::Result<SourceFile> {
            let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
            Ok(SourceFile::new(path.to_string_lossy(), text))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let container = Container::new(config);
    let result = container.compile_batch(&sources);

    let emitted: Vec<&EmittedFile> = result.emitted().collect();
    emitted
        .par_iter()
        .try_for_each(|file| write_output(file, &root_dir, &out_dir))?;

    if copy_assets {
        copy_assets_to_output(&inputs.assets, &root_dir, &out_dir)?;
    }

    if result.has_failures() {
        let failed = result.failures().count();
        let skipped = result.skipped();
        if skipped > 0 {
            eprintln!("Build failed: {} file(s) with errors, {} skipped", failed, skipped);
        } else {
            eprintln!("Build failed: {} file(s) with errors", failed);
        }
        std::process::exit(1);
    }

    info!(
        "Compiled {} file(s) with {} warning(s)",
        emitted.len(),
        container.warning_count()
    );
    Ok(())
}

fn init_project() -> anyhow::Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        bail!("{} already exists in this directory", CONFIG_FILE_NAME);
    }

    println!("Initializing new BorisType project...");
    CompilerConfig::init_file(config_path)?;
    println!("Created {}", CONFIG_FILE_NAME);

    fs::create_dir_all("src")?;
    println!("Created src/ directory");

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<CompilerConfig> {
    let mut config = if let Some(ref project_path) = cli.project {
        CompilerConfig::from_file(project_path)
            .with_context(|| format!("Failed to load config file {}", project_path.display()))?
    } else {
        let default_path = Path::new(CONFIG_FILE_NAME);
        if default_path.exists() {
            CompilerConfig::from_file(default_path)
                .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME))?
        } else {
            CompilerConfig::default()
        }
    };

    // Flags only ever switch an option away from its default
    let overrides = CliOverrides {
        out_dir: cli.out_dir.as_ref().map(|dir| dir.to_string_lossy().into_owned()),
        root_dir: cli.root_dir.as_ref().map(|dir| dir.to_string_lossy().into_owned()),
        escape_non_ascii: cli.escape_non_ascii.then_some(true),
        include_non_ts_files: cli.include_non_ts_files.then_some(true),
        emit_bom: cli.no_bom.then_some(false),
        abort_on_error: cli.abort_on_error.then_some(true),
        pretty: cli.no_pretty.then_some(false),
    };
    config.merge(&overrides);

    Ok(config)
}

/// Command-line files (directories are walked) or, without any, the config `include`
/// globs. `exclude` applies to both.
fn collect_inputs(cli: &Cli, config: &CompilerConfig) -> anyhow::Result<Inputs> {
    let exclude = config
        .exclude
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid exclude pattern `{}`", pattern))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut candidates = Vec::new();
    if cli.files.is_empty() {
        for pattern in &config.include {
            let entries =
                glob::glob(pattern).with_context(|| format!("Invalid include pattern `{}`", pattern))?;
            candidates.extend(entries.filter_map(|entry| entry.ok()));
        }
    } else {
        for path in &cli.files {
            if path.is_dir() {
                candidates.extend(
                    WalkDir::new(path)
                        .follow_links(false)
                        .into_iter()
                        .filter_map(|entry| entry.ok())
                        .filter(|entry| entry.file_type().is_file())
                        .map(|entry| entry.into_path()),
                );
            } else {
                candidates.push(path.clone());
            }
        }
    }

    let mut seen = FxHashSet::default();
    let mut inputs = Inputs::default();
    for path in candidates {
        if exclude.iter().any(|pattern| pattern.matches_path(&path)) {
            debug!("Excluded: {}", path.display());
            continue;
        }
        if is_declaration_file(&path) {
            continue;
        }
        let path = fs::canonicalize(&path).with_context(|| format!("Cannot open {}", path.display()))?;
        if !seen.insert(path.clone()) {
            continue;
        }
        if is_script(&path) {
            inputs.scripts.push(path);
        } else if path.is_file() {
            inputs.assets.push(path);
        }
    }

    Ok(inputs)
}

fn is_script(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("ts") | Some("js")
    )
}

fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".d.ts"))
}

/// Deepest directory containing every path
fn common_root<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> PathBuf {
    let mut root: Option<PathBuf> = None;
    for path in paths {
        let parent = path.parent().unwrap_or(path);
        root = Some(match root {
            None => parent.to_path_buf(),
            Some(mut current) => {
                while !parent.starts_with(&current) && current.pop() {}
                current
            }
        });
    }
    root.unwrap_or_else(|| PathBuf::from("."))
}

/// Mirror `input` under `out_dir`; files outside `root_dir` land at the top level
fn mirrored_path(input: &Path, root_dir: &Path, out_dir: &Path) -> PathBuf {
    let relative = input
        .strip_prefix(root_dir)
        .unwrap_or_else(|_| input.file_name().map(Path::new).unwrap_or(input));
    out_dir.join(relative)
}

fn write_output(file: &EmittedFile, root_dir: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let output_path =
        mirrored_path(Path::new(&file.name), root_dir, out_dir).with_extension(file.kind.extension());
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(&output_path, &file.text)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    debug!("Wrote {}", output_path.display());
    Ok(())
}

fn copy_assets_to_output(assets: &[PathBuf], root_dir: &Path, out_dir: &Path) -> anyhow::Result<()> {
    info!("Copying {} non-script file(s) to {}", assets.len(), out_dir.display());

    for asset in assets {
        let output_path = mirrored_path(asset, root_dir, out_dir);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::copy(asset, &output_path) {
            Ok(_) => debug!("Copied: {} -> {}", asset.display(), output_path.display()),
            Err(e) => warn!("Failed to copy {}: {}", asset.display(), e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_detection() {
        assert!(is_script(Path::new("src/a.ts")));
        assert!(is_script(Path::new("src/a.js")));
        assert!(!is_script(Path::new("src/a.txt")));
        assert!(is_declaration_file(Path::new("types/global.d.ts")));
        assert!(!is_declaration_file(Path::new("src/d.ts")));
    }

    #[test]
    fn test_common_root() {
        let paths = vec![
            PathBuf::from("/p/src/a.ts"),
            PathBuf::from("/p/src/lib/b.ts"),
            PathBuf::from("/p/src/lib/deep/c.ts"),
        ];
        assert_eq!(common_root(paths.iter()), PathBuf::from("/p/src"));
        assert_eq!(common_root(paths[1..].iter()), PathBuf::from("/p/src/lib"));
    }

    #[test]
    fn test_mirrored_path() {
        let out = mirrored_path(Path::new("/p/src/lib/b.ts"), Path::new("/p/src"), Path::new("build"));
        assert_eq!(out, PathBuf::from("build/lib/b.ts"));
        let outside = mirrored_path(Path::new("/q/c.ts"), Path::new("/p/src"), Path::new("build"));
        assert_eq!(outside, PathBuf::from("build/c.ts"));
    }
}
