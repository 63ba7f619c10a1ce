//! `ssg engines` — the supported engine table.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ssg_core::descriptors;

/// Arguments for `ssg engines`.
#[derive(Args, Debug)]
pub struct EnginesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EngineJson {
    engine: &'static str,
    extensions: Vec<&'static str>,
    module: &'static str,
    precompile: bool,
}

#[derive(Tabled)]
struct EngineRow {
    #[tabled(rename = "engine")]
    engine: &'static str,
    #[tabled(rename = "extensions")]
    extensions: String,
    #[tabled(rename = "module")]
    module: &'static str,
    #[tabled(rename = "precompile")]
    precompile: &'static str,
}

impl EnginesArgs {
    pub fn run(self) -> Result<()> {
        if self.json {
            let payload: Vec<EngineJson> = descriptors()
                .iter()
                .map(|d| EngineJson {
                    engine: d.engine.as_str(),
                    extensions: d.extensions.to_vec(),
                    module: d.module,
                    precompile: d.engine.supports_precompile(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize engines")?
            );
            return Ok(());
        }

        let rows: Vec<EngineRow> = descriptors()
            .iter()
            .map(|d| EngineRow {
                engine: d.engine.as_str(),
                extensions: d
                    .extensions
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(" "),
                module: d.module,
                precompile: if d.engine.supports_precompile() {
                    "yes"
                } else {
                    "no"
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
