use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use colored::Colorize;
use portal_client::{HttpClient, Method, OutboundRequest, ResponseSource};

use crate::cli::OutputFormat;
use crate::output::{print_success, print_value};

fn parse_params(raw_params: &[String]) -> Result<Vec<(String, String)>> {
    raw_params
        .iter()
        .map(|p| {
            let (key, value) = p
                .split_once('=')
                .with_context(|| format!("Invalid parameter \"{p}\". Expected key=value"))?;
            if key.is_empty() {
                anyhow::bail!("Invalid parameter \"{p}\". Key must not be empty");
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

fn read_body(file: &Option<String>) -> Result<serde_json::Value> {
    let content = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON")
}

pub async fn get(
    client: &dyn HttpClient,
    path: &str,
    raw_params: &[String],
    format: OutputFormat,
) -> Result<()> {
    let params = parse_params(raw_params)?;
    let resp = client.get_with_query(path, &params).await?;
    if resp.source == ResponseSource::Cache {
        tracing::debug!(path, "Served from response cache");
    }
    print_value(&resp.data, format);
    Ok(())
}

pub async fn delete(
    client: &dyn HttpClient,
    path: &str,
    raw_params: &[String],
    format: OutputFormat,
) -> Result<()> {
    let mut request = OutboundRequest::delete(path);
    request.query = parse_params(raw_params)?;
    let resp = client.send(request).await?;
    print_success(&format!("Deleted {}", path.cyan()));
    if !resp.data.is_null() {
        print_value(&resp.data, format);
    }
    Ok(())
}

pub async fn write(
    client: &dyn HttpClient,
    method: Method,
    path: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let body = read_body(file)?;
    let verb = method.to_string();
    let resp = client
        .send(OutboundRequest::new(method, path).with_body(body))
        .await?;
    print_success(&format!("{} {} (HTTP {})", verb, path.cyan(), resp.status));
    print_value(&resp.data, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["page=1".to_string(), "q=a=b".to_string(), "empty=".to_string()]).unwrap();
        assert_eq!(
            params,
            vec![
                ("page".to_string(), "1".to_string()),
                ("q".to_string(), "a=b".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );

        assert!(parse_params(&["page".to_string()]).is_err());
        assert!(parse_params(&["=1".to_string()]).is_err());
    }

    #[test]
    fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lead.json");
        fs::write(&path, r#"{"company": "Acme"}"#).unwrap();

        let body = read_body(&Some(path.display().to_string())).unwrap();
        assert_eq!(body["company"], "Acme");

        fs::write(&path, "{").unwrap();
        assert!(read_body(&Some(path.display().to_string())).is_err());
    }
}
