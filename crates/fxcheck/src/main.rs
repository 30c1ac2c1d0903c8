mod check;
mod cli;
mod config;
mod paths;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cli::Command;
use config::FileConfig;
use paths::{resolve_roots, AppPaths, SearchRoots, ENV_SHADER_DIR};
use postfx::{StageKind, UniformValue};
use shaderpack::{LocalPack, ShaderRepository};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let cli = cli::parse();
    initialise_tracing();

    let paths = AppPaths::discover();
    let config_path = cli.config.clone().or_else(|| paths.default_config());
    let config = match &config_path {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let roots = resolve_roots(
        &cli.roots,
        &config.roots,
        env::var_os(ENV_SHADER_DIR),
        || paths.default_roots(),
    );
    debug!(origin = %roots.origin, roots = ?roots.paths, "resolved search roots");
    let repository = ShaderRepository::new(roots.paths.clone());

    match cli.command {
        Command::List => run_list(&repository),
        Command::Show { id } => run_show(&repository, &id),
        Command::Check { ids } => run_check(&repository, &ids),
        Command::Where => run_where(&roots, config_path, &config),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_list(repository: &ShaderRepository) -> Result<ExitCode> {
    let entries = repository.list()?;
    if entries.is_empty() {
        println!("No shader packs found in {:?}", repository.roots());
        return Ok(ExitCode::SUCCESS);
    }
    for entry in entries {
        match LocalPack::load(&entry.dir) {
            Ok(pack) => println!("{:<24} {}", entry.id, pack.display_name()),
            Err(err) => {
                warn!(path = %entry.dir.display(), error = %err, "shader pack does not load");
                println!("{:<24} (invalid: {err})", entry.id);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_show(repository: &ShaderRepository, id: &str) -> Result<ExitCode> {
    let pack = repository.resolve(id)?;
    let manifest = pack.manifest();
    println!("Name:          {}", pack.display_name());
    if let Some(description) = &manifest.description {
        println!("Description:   {description}");
    }
    println!("Directory:     {}", pack.root().display());
    println!("Vertex:        {}", pack.stage_path(StageKind::Vertex).display());
    println!("Fragment:      {}", pack.stage_path(StageKind::Fragment).display());
    println!("Logical scale: {}", manifest.logical_scale);

    let metadata = manifest.metadata();
    if metadata.uniforms.is_empty() {
        println!("Uniforms:      (none)");
    } else {
        println!("Uniforms:");
        for (name, value) in &metadata.uniforms {
            println!("  {name} = {}", describe_value(value));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check(repository: &ShaderRepository, ids: &[String]) -> Result<ExitCode> {
    let targets: Vec<(String, Result<LocalPack, String>)> = if ids.is_empty() {
        repository
            .list()?
            .into_iter()
            .map(|entry| {
                let pack = LocalPack::load(&entry.dir).map_err(|err| err.to_string());
                (entry.id, pack)
            })
            .collect()
    } else {
        ids.iter()
            .map(|id| (id.clone(), repository.resolve(id).map_err(|err| err.to_string())))
            .collect()
    };

    if targets.is_empty() {
        println!("No shader packs found in {:?}", repository.roots());
        return Ok(ExitCode::SUCCESS);
    }

    let mut failures = 0usize;
    for (id, pack) in &targets {
        let issues = match pack {
            Ok(pack) => check::check_pack(pack),
            Err(err) => vec![err.clone()],
        };
        if issues.is_empty() {
            println!("ok    {id}");
            continue;
        }
        failures += 1;
        println!("FAIL  {id}");
        for issue in issues {
            println!("      - {issue}");
        }
    }

    println!("{} checked, {failures} failed", targets.len());
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_where(
    roots: &SearchRoots,
    config_path: Option<PathBuf>,
    config: &FileConfig,
) -> Result<ExitCode> {
    println!("Search roots (from {}):", roots.origin);
    for root in &roots.paths {
        let marker = if root.is_dir() { "" } else { " (missing)" };
        println!("  {}{marker}", root.display());
    }
    match config_path {
        Some(path) => println!("Config file:  {}", path.display()),
        None => println!("Config file:  (none)"),
    }
    println!("Backend:      {:?}", config.pipeline.backend);
    let [r, g, b, a] = config.pipeline.clear_color;
    println!("Clear colour: {r} {g} {b} {a}");
    Ok(ExitCode::SUCCESS)
}

fn describe_value(value: &UniformValue) -> String {
    match value {
        UniformValue::Bool(value) => value.to_string(),
        UniformValue::Int(value) => value.to_string(),
        UniformValue::Float(value) => format!("{value:?}"),
        UniformValue::Vec2(values) => format!("vec2{values:?}"),
        UniformValue::Vec3(values) => format!("vec3{values:?}"),
        UniformValue::Vec4(values) => format!("vec4{values:?}"),
    }
}
