use anyhow::{Context, Result};
use colored::Colorize;
use portal_client::{CatalogStore, Estimate, FeatureCatalog};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::output::print_value;

pub fn list(store: &CatalogStore, service: Option<&str>, format: OutputFormat) -> Result<()> {
    let catalog = store.snapshot();

    match format {
        OutputFormat::Json => {
            let value = match service {
                Some(id) => serde_json::to_value(find_service(&catalog, id)?)?,
                None => serde_json::to_value(&catalog)?,
            };
            print_value(&value, format);
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            match service {
                Some(id) => {
                    let svc = find_service(&catalog, id)?;
                    println!("{} {} (base {})", "Service:".cyan(), svc.name.cyan(), svc.base_price);
                    builder.push_record(["Feature", "Name", "Price"]);
                    for f in &svc.features {
                        builder.push_record([f.id.clone(), f.name.clone(), f.price.to_string()]);
                    }
                }
                None => {
                    builder.push_record(["Service", "Name", "Base price", "Features"]);
                    for s in &catalog.services {
                        builder.push_record([
                            s.id.clone(),
                            s.name.clone(),
                            s.base_price.to_string(),
                            s.features.len().to_string(),
                        ]);
                    }
                }
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}

fn find_service<'a>(catalog: &'a FeatureCatalog, id: &str) -> Result<&'a portal_client::Service> {
    catalog
        .service(id)
        .with_context(|| format!("Unknown service: {id}"))
}

pub fn estimate(
    store: &CatalogStore,
    service: &str,
    features: &[String],
    format: OutputFormat,
) -> Result<()> {
    let ids: Vec<&str> = features.iter().map(String::as_str).collect();
    let estimate = store.estimate(service, &ids)?;

    match format {
        OutputFormat::Json => print_value(&serde_json::to_value(&estimate)?, format),
        OutputFormat::Table => println!("{}", estimate_table(&estimate)),
    }
    Ok(())
}

fn estimate_table(estimate: &Estimate) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Item", "Price"]);
    builder.push_record([format!("{} (base)", estimate.service), estimate.base_price.to_string()]);
    for f in &estimate.features {
        builder.push_record([f.name.clone(), f.price.to_string()]);
    }
    builder.push_record(["Total".to_string(), estimate.total.to_string()]);
    builder.build().with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_table() {
        let store = CatalogStore::default();
        let estimate = store.estimate("website", &["cms"]).unwrap();
        let table = estimate_table(&estimate);
        assert!(table.contains("website (base)"));
        assert!(table.contains("Content Management System"));
        assert!(table.contains("2000"));
    }

    #[test]
    fn test_unknown_service() {
        let store = CatalogStore::default();
        assert!(list(&store, Some("kiosk"), OutputFormat::Json).is_err());
        assert!(estimate(&store, "kiosk", &[], OutputFormat::Json).is_err());
    }
}
