use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

use crate::api::Method;

#[derive(Parser, Debug)]
#[command(name = "restkit")]
#[command(version)]
#[command(about = "Inspect a REST backend through the cached resource layer", long_about = None)]
pub struct Cli {
    /// Path to configuration file (replaces the global and project files)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, env = "RESTKIT_BASE_URL")]
    pub base_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource collection
    List {
        /// Resource type, e.g. areas or temperature-humidity
        resource: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },
    /// Fetch a single item
    Get {
        resource: String,
        id: String,
        #[arg(long)]
        refresh: bool,
    },
    /// Issue an arbitrary request
    Call {
        /// Path relative to the base URL
        url: String,
        #[arg(short = 'X', long, default_value = "get")]
        method: Method,
        /// JSON request body
        #[arg(short, long, value_parser = parse_json)]
        data: Option<Value>,
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Probe the local terminal and report the detected environment
    Detect,
    /// Initialize configuration
    Init,
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}

/// `key=value`; the value is read as JSON when it parses, else as a string
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON body: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_param_types() {
        assert_eq!(parse_param("page=2").unwrap(), ("page".to_string(), json!(2)));
        assert_eq!(parse_param("q=lab").unwrap(), ("q".to_string(), json!("lab")));
        assert_eq!(parse_param("flag=true").unwrap(), ("flag".to_string(), json!(true)));
        assert_eq!(parse_param("expr=a=b").unwrap(), ("expr".to_string(), json!("a=b")));
    }

    #[test]
    fn test_parse_param_rejects_malformed() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_cli_parses_call() {
        let cli = Cli::try_parse_from([
            "restkit", "call", "/api/areas/3/favor/", "-X", "post", "--data", "{\"on\":true}",
        ])
        .unwrap();

        match cli.command {
            Commands::Call { url, method, data, params } => {
                assert_eq!(url, "/api/areas/3/favor/");
                assert_eq!(method, Method::Post);
                assert_eq!(data, Some(json!({"on": true})));
                assert!(params.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
