//! WARRANT CLI
//!
//! Operator tools for authorization settings.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use http::Method;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use warrant_core::{Action, ModelMeta, PermissionId};
use warrant_policy::AuthSettings;
use warrant_rest::ObjectPermissions;

#[derive(Parser)]
#[command(name = "warrant")]
#[command(about = "WARRANT - object-level permission policies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a settings file
    ValidateSettings {
        /// Path to settings JSON
        #[arg(short, long)]
        settings: PathBuf,
    },
    /// Show the permissions a request method requires on a model
    RequiredPerms {
        /// Path to settings JSON; defaults apply when omitted
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Model label, e.g. `blog.post`
        #[arg(short, long)]
        model: String,
        /// HTTP method
        #[arg(long)]
        method: String,
    },
    /// Show the permission identifier for an action on a model
    Permission {
        /// Model label, e.g. `blog.post`
        #[arg(short, long)]
        model: String,
        /// Action verb, e.g. `change` or `publish`
        #[arg(short, long)]
        action: String,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warrant=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::ValidateSettings { settings } => validate_settings(&settings)?,
        Commands::RequiredPerms {
            settings,
            model,
            method,
        } => required_perms(settings.as_deref(), &model, &method)?,
        Commands::Permission { model, action } => permission(&model, &action)?,
    };
    print!("{output}");
    Ok(())
}

fn load_settings(path: &Path) -> Result<AuthSettings> {
    AuthSettings::from_path(path)
        .wrap_err_with(|| format!("Invalid settings file {}", path.display()))
}

fn validate_settings(path: &Path) -> Result<String> {
    let settings = load_settings(path)?;
    // Method overrides must also parse as HTTP methods
    ObjectPermissions::from_settings(&settings)?;
    tracing::info!(path = %path.display(), "settings are valid");

    let mut out = String::new();
    writeln!(out, "backends: {}", settings.backends.join(", "))?;
    for (method, templates) in &settings.object_permissions {
        let templates: Vec<&str> = templates.iter().map(|t| t.as_str()).collect();
        writeln!(out, "{method}: [{}]", templates.join(", "))?;
    }
    Ok(out)
}

fn required_perms(settings: Option<&Path>, model: &str, method: &str) -> Result<String> {
    let permissions = match settings {
        Some(path) => ObjectPermissions::from_settings(&load_settings(path)?)?,
        None => ObjectPermissions::new(),
    };
    let model = ModelMeta::parse(model)?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| eyre!("Invalid HTTP method: '{method}'"))?;

    let mut out = String::new();
    for perm in permissions.get_required_permissions(&method, &model)? {
        writeln!(out, "{perm}")?;
    }
    Ok(out)
}

fn permission(model: &str, action: &str) -> Result<String> {
    let model = ModelMeta::parse(model)?;
    let action: Action = action.parse()?;
    Ok(format!("{}\n", PermissionId::for_action(&action, &model)))
}
