use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    HttpExecutor, RequestExecutor, Resource, ResourceStore,
};
use serde_json::{Map, Value};
use shared::domain::{CaseBucket, PopSchedule, SimulationRun};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_store, RunRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Which {
    All,
    CaseFiles,
    Experiments,
    Schedules,
}

/// Lists case files, simulation runs and schedules through the API proxy.
#[derive(Parser, Debug)]
struct Args {
    /// Proxy origin; overrides the settings file and environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long, value_enum, default_value_t = Which::All)]
    resource: Which,
    /// Print store state as JSON instead of tables.
    #[arg(long)]
    json: bool,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
}

impl Args {
    fn wants(&self, which: Which) -> bool {
        self.resource == Which::All || self.resource == which
    }
}

async fn load_if<R, E>(wanted: bool, executor: &E) -> Option<ResourceStore<R>>
where
    R: Resource,
    E: RequestExecutor + ?Sized,
{
    if wanted {
        Some(ResourceStore::load_resource(executor).await)
    } else {
        None
    }
}

fn state_json<R>(out: &mut Map<String, Value>, store: &ResourceStore<R>) -> Result<()>
where
    R: Resource + serde::Serialize,
{
    let state = serde_json::to_value(store.snapshot())
        .with_context(|| format!("failed to encode state of {}", store.id()))?;
    out.insert(store.id().to_string(), state);
    Ok(())
}

fn failed<R: Resource>(store: &Option<ResourceStore<R>>) -> usize {
    store.as_ref().map_or(0, |s| usize::from(s.error().is_some()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings_from(&args.config)?;
    if let Some(url) = args.api_base_url.clone() {
        settings.api_base_url = url;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let executor = HttpExecutor::new(&settings.api_base_url)
        .with_context(|| format!("invalid api base url '{}'", settings.api_base_url))?;
    info!(base_url = %executor.base_url(), "console: loading resources");

    let (case_files, experiments, schedules) = tokio::join!(
        load_if::<CaseBucket, _>(args.wants(Which::CaseFiles), &executor),
        load_if::<SimulationRun, _>(args.wants(Which::Experiments), &executor),
        load_if::<PopSchedule, _>(args.wants(Which::Schedules), &executor),
    );

    if args.json {
        let mut out = Map::new();
        if let Some(store) = &case_files {
            state_json(&mut out, store)?;
        }
        if let Some(store) = &experiments {
            state_json(&mut out, store)?;
        }
        if let Some(store) = &schedules {
            state_json(&mut out, store)?;
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
    } else {
        if let Some(store) = &case_files {
            println!("{}", render_store("Case files", store));
        }
        if let Some(store) = &experiments {
            println!("{}", render_store("Experiments", store));
        }
        if let Some(store) = &schedules {
            println!("{}", render_store("Schedules", store));
        }
    }

    let failures = failed(&case_files) + failed(&experiments) + failed(&schedules);
    if failures > 0 {
        bail!("{failures} resource(s) failed to load");
    }
    Ok(())
}

impl RunRow for CaseBucket {
    fn columns(&self) -> [String; 5] {
        render::run_columns(
            &self.id,
            &self.name,
            &self.user,
            &self.start_time,
            &self.status,
        )
    }
}

impl RunRow for PopSchedule {
    fn columns(&self) -> [String; 5] {
        render::run_columns(
            &self.id,
            &self.name,
            &self.user,
            &self.start_time,
            &self.status,
        )
    }
}

impl RunRow for SimulationRun {
    fn columns(&self) -> [String; 5] {
        let mut columns = render::run_columns(
            &self.id,
            &self.name,
            &self.user,
            &self.start_time,
            &self.status,
        );
        if self.is_selected {
            columns[1].push_str(" *");
        }
        columns
    }
}
