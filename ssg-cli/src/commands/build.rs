//! `ssg build` — build every template of a project.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ssg_core::SiteConfig;
use ssg_pipeline::{AssetOutcome, BuildOptions, BuildReport, BuildSession, WriteResult};

use super::from_cwd;

/// Arguments for `ssg build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project root containing `ssg.yaml`.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Output directory (overrides `out_dir`).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Global data file (overrides `globals_file`).
    #[arg(long)]
    pub globals: Option<PathBuf>,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl BuildArgs {
    pub async fn run(self) -> Result<()> {
        let root = from_cwd(&self.root)?;
        let mut site = SiteConfig::load_at(&root)
            .with_context(|| format!("failed to load site config in {}", root.display()))?;
        if let Some(out) = &self.out {
            site.out_dir = from_cwd(out)?;
        }
        if let Some(globals) = &self.globals {
            site.globals_file = Some(from_cwd(globals)?);
        }

        let mut options =
            BuildOptions::from_site(&root, &site).context("failed to prepare build")?;
        options.dry_run = self.dry_run;
        tracing::debug!(
            source = %options.source_root.display(),
            out = %options.out_root.display(),
            concurrency = options.concurrency,
            "build options"
        );

        let report = BuildSession::new(options)
            .build()
            .await
            .context("build failed")?;
        print_report(&report, &root, self.dry_run);

        let failed = report.failures().count();
        if failed > 0 {
            bail!("{failed} template(s) failed to build");
        }
        Ok(())
    }
}

fn print_report(report: &BuildReport, root: &Path, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.assets.is_empty() {
        println!("{prefix}No templates found.");
        return;
    }

    for AssetOutcome { source, result } in &report.assets {
        let source = display_path(source, root);
        match result {
            Ok(writes) => {
                let unchanged = writes
                    .iter()
                    .filter(|w| matches!(w, WriteResult::Unchanged { .. }))
                    .count();
                println!(
                    "{prefix}{} {source} ({} written, {unchanged} unchanged)",
                    "✓".green(),
                    writes.len() - unchanged,
                );
                for w in writes {
                    let path = display_path(w.path(), root);
                    match w {
                        WriteResult::Written { .. } => println!("  ✎  {path}"),
                        WriteResult::WouldWrite { .. } => println!("  ~  {path}"),
                        WriteResult::Unchanged { .. } => println!("  ·  {path}"),
                    }
                }
            }
            Err(err) => println!("{prefix}{} {source}: {err}", "✗".red()),
        }
    }

    let total = report.assets.len();
    let failed = report.failures().count();
    let summary = format!("{} of {total} templates built", total - failed);
    if failed == 0 {
        println!("{}", summary.bold());
    } else {
        println!("{} ({})", summary.bold(), format!("{failed} failed").red());
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
