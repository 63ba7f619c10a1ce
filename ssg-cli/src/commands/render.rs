//! `ssg render` — render one template to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use ssg_core::{read_globals_file, SiteConfig};
use ssg_pipeline::{render_one, AssetContext};

use super::from_cwd;

/// Arguments for `ssg render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template file to render.
    pub file: PathBuf,

    /// Global data file (defaults to the globals of `./ssg.yaml`).
    #[arg(long)]
    pub globals: Option<PathBuf>,
}

impl RenderArgs {
    pub async fn run(self) -> Result<()> {
        let root = std::env::current_dir().context("could not determine current directory")?;
        let file = from_cwd(&self.file)?;
        let global_data = match &self.globals {
            Some(path) => {
                let path = from_cwd(path)?;
                Value::Object(read_globals_file(&path).with_context(|| {
                    format!("failed to read globals from {}", path.display())
                })?)
            }
            None => SiteConfig::load_at(&root)
                .and_then(|site| site.load_globals(&root))
                .context("failed to load site globals")?,
        };

        let ctx = Arc::new(AssetContext::new(root, global_data));
        let output = render_one(ctx, &file)
            .await
            .with_context(|| format!("failed to render {}", self.file.display()))?;
        print!("{output}");
        Ok(())
    }
}
