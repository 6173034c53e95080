use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use layermix::{
    CancelToken, Canvas, ExportOpts, ExportOutcome, ExportSession, GenerationOutcome, LayerStack,
    LoadOpts, PngCompression, ProjectFile,
};

#[derive(Parser, Debug)]
#[command(name = "layermix", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite every legal combination into a directory of PNGs.
    Export(ExportArgs),
    /// List the combinations an export would produce.
    Plan(ProjectArgs),
    /// Check the current selection against the exclusion rules.
    Check(ProjectArgs),
    /// Composite the current selection to a single PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Input project (.lmp JSON).
    #[arg(long)]
    project: PathBuf,

    /// Fail on image files that do not exist instead of skipping them.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: ProjectArgs,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Maximum worker threads.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Override the project's canvas width.
    #[arg(long)]
    width: Option<u32>,

    /// Override the project's canvas height.
    #[arg(long)]
    height: Option<u32>,

    /// PNG compression effort.
    #[arg(long, value_enum, default_value_t = Compression::Default)]
    compression: Compression,

    /// Decode images per combination instead of once up front.
    #[arg(long, default_value_t = false)]
    no_preload: bool,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: ProjectArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Write the preview even when the selection violates exclusion rules.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Compression {
    Fast,
    Default,
    Best,
}

impl From<Compression> for PngCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Fast => PngCompression::Fast,
            Compression::Default => PngCompression::Default,
            Compression::Best => PngCompression::Best,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Check(args) => cmd_check(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &ProjectArgs) -> anyhow::Result<(LayerStack, Canvas)> {
    let project = ProjectFile::from_path(&args.project)?;
    let opts = LoadOpts {
        skip_missing_images: !args.strict,
        base_dir: args.project.parent().map(Path::to_path_buf),
    };
    let stack = project
        .to_stack(&opts)
        .with_context(|| format!("load project '{}'", args.project.display()))?;
    Ok((stack, project.canvas()?))
}

fn preload(stack: &mut LayerStack, canvas: Canvas) {
    let report = layermix::preload_rasters(stack, Some(canvas));
    for f in &report.failures {
        eprintln!("skipping preload of {}: {}", f.path.display(), f.reason);
    }
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (mut stack, canvas) = load(&args.input)?;
    let canvas = Canvas::new(
        args.width.unwrap_or(canvas.width),
        args.height.unwrap_or(canvas.height),
    )?;
    if !args.no_preload {
        preload(&mut stack, canvas);
    }

    let session = ExportSession::new(&stack, canvas)?;
    let opts = ExportOpts {
        max_workers: args.workers,
        compression: args.compression.into(),
    };
    let progress = |completed: usize, total: usize| {
        eprint!("\rexported {completed}/{total}");
        if completed == total {
            eprintln!();
        }
    };
    let outcome = session.export(&args.out, &opts, &progress, &CancelToken::new())?;

    match outcome {
        ExportOutcome::NothingToExport(reason) => {
            eprintln!("nothing to export: {reason}");
            Ok(())
        }
        ExportOutcome::AllExcluded {
            rejected,
            conflicts,
        } => {
            eprintln!("all {rejected} combinations are excluded by mutex rules:");
            for c in &conflicts {
                eprintln!("  {c}");
            }
            Ok(())
        }
        ExportOutcome::Exported(report) => {
            eprintln!("{report} -> {}", args.out.display());
            for f in &report.failures {
                eprintln!("  #{} {} [{}]: {}", f.combination_id, f.file_name, f.kind, f.reason);
            }
            if report.failed > 0 {
                anyhow::bail!("{} combinations failed to export", report.failed);
            }
            Ok(())
        }
    }
}

fn cmd_plan(args: ProjectArgs) -> anyhow::Result<()> {
    let (stack, canvas) = load(&args)?;
    let session = ExportSession::new(&stack, canvas)?;
    match session.plan() {
        GenerationOutcome::ConfigurationEmpty(reason) => {
            println!("nothing to export: {reason}");
        }
        GenerationOutcome::AllCombinationsExcluded {
            rejected,
            conflicts,
        } => {
            println!("all {rejected} combinations are excluded by mutex rules");
            for c in &conflicts {
                println!("  {c}");
            }
        }
        GenerationOutcome::Ready(combinations) => {
            for c in &combinations {
                let tag = c.tag.as_ref().map(|t| t.as_str()).unwrap_or("-");
                println!(
                    "{}\t{tag}\t{}",
                    c.id,
                    layermix::output_file_name(c)
                );
            }
            println!("{} combinations", combinations.len());
        }
    }
    Ok(())
}

fn cmd_check(args: ProjectArgs) -> anyhow::Result<()> {
    let (stack, canvas) = load(&args)?;
    let session = ExportSession::new(&stack, canvas)?;
    println!("{}", session.current_selection().describe());
    let conflicts = session.check_current();
    if conflicts.is_empty() {
        println!("ok");
        return Ok(());
    }
    for c in &conflicts {
        println!("conflict: {c}");
    }
    anyhow::bail!(
        "current selection violates {} exclusion rule(s)",
        conflicts.len()
    )
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let (mut stack, canvas) = load(&args.input)?;
    preload(&mut stack, canvas);
    let session = ExportSession::new(&stack, canvas)?;

    let conflicts = session.check_current();
    if !conflicts.is_empty() && !args.force {
        for c in &conflicts {
            eprintln!("conflict: {c}");
        }
        anyhow::bail!("current selection is excluded by mutex rules (use --force to render it)");
    }

    let raster = session.preview()?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    layermix::write_png(&raster, &args.out, PngCompression::Default)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
