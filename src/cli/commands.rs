use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    api::{Params, ResourceId},
    app::{get_config_dir, init_config, load_config, load_config_from, Config},
    services::{ApiServices, EnvironmentInfo, NoAuth},
};

use super::{Cli, Commands, OutputFormat};

/// Resolve the configuration for this invocation
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(&[path.as_path()])?,
        None => load_config()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

/// Handle CLI subcommands
pub async fn handle_command(cli: &Cli, config: Config) -> Result<()> {
    match &cli.command {
        Commands::Init => {
            println!("Initializing restkit configuration...");
            for path in init_config()? {
                println!("  {} {}", "created".green(), path.display());
            }
            println!("Configuration initialized successfully!");
            Ok(())
        }
        Commands::Config => {
            show_config(&config)?;
            Ok(())
        }
        Commands::List {
            resource,
            params,
            refresh,
        } => {
            let services = connect(&config)?;
            let params: Params = params.iter().cloned().collect();
            let items = services
                .manager
                .get_list(resource, &params, *refresh)
                .await
                .with_context(|| format!("Failed to list {}", resource))?;
            print_value(&Value::Array(items), &cli.output_format)
        }
        Commands::Get {
            resource,
            id,
            refresh,
        } => {
            let services = connect(&config)?;
            let id = parse_id(id);
            let item = services
                .manager
                .get_by_id(resource, id.clone(), *refresh)
                .await
                .with_context(|| format!("Failed to fetch {}/{}", resource, id))?;
            print_value(&item, &cli.output_format)
        }
        Commands::Call {
            url,
            method,
            data,
            params,
        } => {
            let services = connect(&config)?;
            let params: Params = params.iter().cloned().collect();
            let body = services
                .call
                .call(url, *method, data.clone(), params, false, None)
                .await
                .with_context(|| format!("{} {} failed", method, url))?;
            print_value(&body, &cli.output_format)
        }
        Commands::Detect => {
            let services = connect(&config)?;
            let reachable = services.local_terminal.check_local_available().await;
            let info = services.local_terminal.auto_detect_environment().await;
            match cli.output_format {
                OutputFormat::Json => print_value(&serde_json::to_value(&info)?, &cli.output_format),
                OutputFormat::Text => {
                    show_environment(&config, reachable, &info);
                    Ok(())
                }
            }
        }
    }
}

fn connect(config: &Config) -> Result<ApiServices> {
    ApiServices::from_config(config, Arc::new(NoAuth)).context("Failed to build API client")
}

/// Numeric ids stay numeric; anything else is a slug
fn parse_id(raw: &str) -> ResourceId {
    raw.parse::<u64>()
        .map(ResourceId::Num)
        .unwrap_or_else(|_| ResourceId::Text(raw.to_string()))
}

fn print_value(value: &Value, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => match value {
            Value::Array(items) => {
                println!("{} item(s)", items.len().to_string().bold());
                for item in items {
                    println!("  • {}", summarize(item));
                }
            }
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// One-line description of a list item
fn summarize(item: &Value) -> String {
    let id = item.get("id").map(|v| v.to_string());
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);
    match (id, name) {
        (Some(id), Some(name)) => format!("{} {}", id.cyan(), name),
        (Some(id), None) => id.cyan().to_string(),
        _ => item.to_string(),
    }
}

fn show_config(config: &Config) -> Result<()> {
    let global = get_config_dir()?.join("config.toml");
    let local = PathBuf::from(".restkit/config.toml");

    println!("Configuration sources:");
    for path in [&global, &local] {
        if path.exists() {
            println!("  [OK] {}", path.display());
        } else {
            println!("  {} {} (not found)", "[--]".dimmed(), path.display());
        }
    }
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_environment(config: &Config, reachable: bool, info: &EnvironmentInfo) {
    println!("Local terminal at {}:", config.local.base_url);
    if reachable {
        println!("  [OK] Heartbeat answered");
    } else {
        println!("  {} No heartbeat", "[ERROR]".red());
    }
    println!();
    println!("Environment: {} ({})", info.name.bold(), info.kind);
    println!("  version: {}", info.version);
    if let Some(id) = info.id {
        println!("  id: {}", id);
    }
    let features = [
        ("local detection", info.features.local_detection),
        ("websocket", info.features.websocket),
        ("push mode", info.features.push_mode),
        ("pull mode", info.features.pull_mode),
    ];
    for (name, enabled) in features {
        let mark = if enabled { "yes".green() } else { "no".dimmed() };
        println!("  {}: {}", name, mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), ResourceId::Num(42));
        assert_eq!(parse_id("lab-1"), ResourceId::Text("lab-1".into()));
    }

    #[test]
    fn test_summarize_prefers_id_and_name() {
        colored::control::set_override(false);
        assert_eq!(summarize(&json!({"id": 3, "name": "Library"})), "3 Library");
        assert_eq!(summarize(&json!({"id": 3})), "3");
        assert_eq!(summarize(&json!("plain")), "\"plain\"");
    }
}
