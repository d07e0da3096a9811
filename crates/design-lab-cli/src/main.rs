use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use design_lab::{
    AssetSource, DirectoryAssets, EngineOptions, PageRasterizer, PdfiumRasterizer,
    RenderedArtifact, SideKind, Template, placements, render_batch,
};
use design_lab_runtime::{JsonFileRepository, LogAuditSink, load_records};
use env_logger::Env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dlab", about = "ID card and certificate template designer", version)]
struct Cli {
    /// Engine options file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a template (or refresh one) from a source document
    Ingest {
        /// Source PDF; page 1 is the front, page 2 the back
        #[arg(short, long)]
        input: PathBuf,

        /// Template JSON to write
        #[arg(short, long)]
        output: PathBuf,

        /// Existing template to re-ingest; its fields are cleared
        #[arg(long)]
        template: Option<PathBuf>,

        /// Template id
        #[arg(long, default_value = "template")]
        id: String,

        /// Owning tenant (school)
        #[arg(long, default_value = "default")]
        tenant: String,

        /// Display name; defaults to the input file name
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "identity-card", value_enum)]
        kind: KindArg,

        #[arg(long, default_value = "landscape", value_enum)]
        orientation: OrientationArg,

        /// Directory holding the pdfium library
        #[arg(long)]
        pdfium_dir: Option<PathBuf>,

        /// Also save into a template store directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show where every field lands in the output document
    Inspect {
        #[arg(short, long)]
        template: PathBuf,
    },

    /// Inject one record into a template
    Render {
        #[arg(short, long)]
        template: PathBuf,

        /// Records file (.csv with a header row, or .json)
        #[arg(short, long)]
        records: PathBuf,

        /// Which record to use (zero-based)
        #[arg(long, default_value = "0")]
        index: usize,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Directory photo and signature paths are relative to;
        /// defaults to the records file's directory
        #[arg(long)]
        assets: Option<PathBuf>,
    },

    /// Inject every record, one PDF each
    Batch {
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        records: PathBuf,

        /// Directory to write `<template-id>-<n>.pdf` files into
        #[arg(short, long)]
        output_dir: PathBuf,

        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    IdentityCard,
    Report,
    Certificate,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<KindArg> for design_lab::ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::IdentityCard => Self::IdentityCard,
            KindArg::Report => Self::Report,
            KindArg::Certificate => Self::Certificate,
        }
    }
}

impl From<OrientationArg> for design_lab::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

async fn load_options(config: Option<&Path>) -> Result<EngineOptions> {
    match config {
        Some(path) => EngineOptions::load(path)
            .await
            .with_context(|| format!("loading options from {}", path.display())),
        None => Ok(EngineOptions::default()),
    }
}

async fn load_template(path: &Path) -> Result<Template> {
    Template::load(path)
        .await
        .with_context(|| format!("loading template {}", path.display()))
}

fn asset_source(assets: Option<PathBuf>, records: &Path) -> DirectoryAssets {
    let root = assets.unwrap_or_else(|| {
        records
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    DirectoryAssets::new(root)
}

fn report_unresolved(artifact: &RenderedArtifact) {
    for unresolved in &artifact.unresolved {
        println!("  warning: {}", unresolved);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_level));

    let options = load_options(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Ingest {
            input,
            output,
            template,
            id,
            tenant,
            name,
            kind,
            orientation,
            pdfium_dir,
            store,
        } => {
            let bytes = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;

            let rasterizer: Arc<dyn PageRasterizer> = Arc::new(match pdfium_dir {
                Some(dir) => PdfiumRasterizer::with_library_dir(dir),
                None => PdfiumRasterizer::new(),
            });
            log::debug!("Rasterizing {} with pdfium", input.display());
            let document = design_lab::ingest(bytes, rasterizer, &options).await?;

            let mut template = match template {
                Some(path) => load_template(&path).await?,
                None => {
                    let name = name.unwrap_or_else(|| {
                        input
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_else(|| id.clone())
                    });
                    let mut template =
                        Template::new(id, tenant, name, kind.into(), orientation.into());
                    template.workspace_width = options.workspace_width;
                    template
                }
            };
            template.apply_ingestion(document);
            template.save(&output).await?;

            println!("Template '{}' ({}):", template.name, template.kind);
            for side in SideKind::ALL {
                match template.side(side).dimensions {
                    Some(dims) => println!(
                        "  {}: {} × {} pt",
                        side, dims.width_native, dims.height_native
                    ),
                    None => println!("  {}: (no page)", side),
                }
            }
            println!("Saved → {}", output.display());

            if let Some(store) = store {
                let repository = JsonFileRepository::new(store);
                design_lab::save_template(&repository, &LogAuditSink, &template).await?;
                println!(
                    "Stored → {}",
                    repository
                        .path_for(&template.tenant_id, &template.id)?
                        .display()
                );
            }
        }

        Commands::Inspect { template } => {
            let template = load_template(&template).await?;
            let placements = placements(&template)?;

            println!(
                "Template '{}' ({}), workspace width {} px",
                template.name, template.kind, template.workspace_width
            );
            for side in SideKind::ALL {
                let fields: Vec<_> = placements.iter().filter(|p| p.side == side).collect();
                if fields.is_empty() {
                    continue;
                }
                println!("  {} (ratio {:.4}):", side, fields[0].transform.ratio);
                for placement in fields {
                    let ws = placement.workspace;
                    let native = placement.native;
                    println!(
                        "    #{} {:?} page {}: workspace ({}, {}) {}×{} → native ({:.2}, {:.2}) {:.2}×{:.2}",
                        placement.id,
                        placement.field_type,
                        placement.page_index + 1,
                        ws.x,
                        ws.y,
                        ws.width,
                        ws.height,
                        native.x,
                        native.y,
                        native.width,
                        native.height
                    );
                }
            }
        }

        Commands::Render {
            template,
            records,
            index,
            output,
            assets,
        } => {
            let template = load_template(&template).await?;
            let record = load_records(&records)
                .await?
                .into_iter()
                .nth(index)
                .with_context(|| format!("{} has no record {}", records.display(), index))?;
            let assets: Arc<dyn AssetSource> = Arc::new(asset_source(assets, &records));

            let artifact = design_lab::render(template, record, assets, &options).await?;
            report_unresolved(&artifact);

            tokio::fs::write(&output, &artifact.bytes).await?;
            println!(
                "Rendered {} page(s) → {}",
                artifact.page_count,
                output.display()
            );
        }

        Commands::Batch {
            template,
            records,
            output_dir,
            assets,
        } => {
            let template = load_template(&template).await?;
            let template_id = template.id.clone();
            let rows = load_records(&records).await?;
            let assets = asset_source(assets, &records);

            log::info!("Rendering {} record(s) from {}", rows.len(), records.display());
            let artifacts = tokio::task::spawn_blocking(move || {
                render_batch(&template, &rows, &assets, options.placeholders())
            })
            .await??;

            tokio::fs::create_dir_all(&output_dir).await?;
            for (n, artifact) in artifacts.iter().enumerate() {
                let path = output_dir.join(format!("{}-{:04}.pdf", template_id, n + 1));
                tokio::fs::write(&path, &artifact.bytes).await?;
                log::debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
                if !artifact.unresolved.is_empty() {
                    println!("{}:", path.display());
                    report_unresolved(artifact);
                }
            }
            println!(
                "Rendered {} document(s) → {}",
                artifacts.len(),
                output_dir.display()
            );
        }
    }

    Ok(())
}
