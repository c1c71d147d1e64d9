//! Service and feature price catalog.
//!
//! The catalog is a small reactive store: readers take a snapshot or subscribe
//! to a [`watch`] channel that always holds the latest catalog. Every mutation
//! notifies all subscribers. Authoritative pricing lives with the backend; the
//! estimate here is for display while a quote is being assembled.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// An optional add-on for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub price: u64,
}

impl Feature {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// A service the agency sells, with its base price and available features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub base_price: u64,
    pub features: Vec<Feature>,
}

impl Service {
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCatalog {
    pub services: Vec<Service>,
}

impl FeatureCatalog {
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    fn service_mut(&mut self, id: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.id == id)
    }

    /// The catalog shipped with the portal.
    pub fn standard() -> Self {
        fn service(id: &str, name: &str, base_price: u64, features: &[(&str, &str, u64)]) -> Service {
            Service {
                id: id.to_string(),
                name: name.to_string(),
                base_price,
                features: features
                    .iter()
                    .map(|(id, name, price)| Feature::new(*id, *name, *price))
                    .collect(),
            }
        }

        Self {
            services: vec![
                service(
                    "website",
                    "Business Website",
                    1500,
                    &[
                        ("responsive-design", "Responsive Design", 300),
                        ("cms", "Content Management System", 500),
                        ("seo", "SEO Optimization", 400),
                        ("blog", "Blog", 250),
                        ("contact-forms", "Contact Forms", 100),
                    ],
                ),
                service(
                    "ecommerce",
                    "Online Store",
                    3500,
                    &[
                        ("product-catalog", "Product Catalog", 700),
                        ("payment-gateway", "Payment Gateway", 600),
                        ("inventory", "Inventory Management", 800),
                        ("shipping", "Shipping Integration", 400),
                    ],
                ),
                service(
                    "web-app",
                    "Custom Web Application",
                    6000,
                    &[
                        ("user-auth", "User Authentication", 900),
                        ("admin-dashboard", "Admin Dashboard", 1200),
                        ("api-integration", "Third-party API Integration", 1000),
                        ("realtime", "Real-time Updates", 1500),
                    ],
                ),
            ],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown feature {feature} for service {service}")]
    UnknownFeature { service: String, feature: String },

    #[error("Estimate for service {0} exceeds the representable price range")]
    PriceOverflow(String),
}

/// Price breakdown for a service and a selection of its features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estimate {
    pub service: String,
    pub base_price: u64,
    pub features: Vec<Feature>,
    pub total: u64,
}

/// Observable holder of the current catalog.
#[derive(Debug)]
pub struct CatalogStore {
    sender: watch::Sender<FeatureCatalog>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(FeatureCatalog::standard())
    }
}

impl CatalogStore {
    pub fn new(catalog: FeatureCatalog) -> Self {
        let (sender, _) = watch::channel(catalog);
        Self { sender }
    }

    pub fn snapshot(&self) -> FeatureCatalog {
        self.sender.borrow().clone()
    }

    /// A receiver that starts at the current catalog and sees every change.
    pub fn subscribe(&self) -> watch::Receiver<FeatureCatalog> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Replaces the whole catalog.
    pub fn replace(&self, catalog: FeatureCatalog) {
        self.sender.send_replace(catalog);
    }

    /// Adds a feature to a service, or replaces the one with the same id.
    pub fn upsert_feature(&self, service_id: &str, feature: Feature) -> Result<(), CatalogError> {
        let mut result = Ok(());
        self.sender.send_if_modified(|catalog| {
            let Some(service) = catalog.service_mut(service_id) else {
                result = Err(CatalogError::UnknownService(service_id.to_string()));
                return false;
            };
            match service.features.iter_mut().find(|f| f.id == feature.id) {
                Some(existing) => *existing = feature.clone(),
                None => service.features.push(feature.clone()),
            }
            true
        });
        result
    }

    /// Removes a feature from a service and returns it.
    pub fn remove_feature(&self, service_id: &str, feature_id: &str) -> Result<Feature, CatalogError> {
        let mut result = Err(CatalogError::UnknownService(service_id.to_string()));
        self.sender.send_if_modified(|catalog| {
            let Some(service) = catalog.service_mut(service_id) else {
                return false;
            };
            match service.features.iter().position(|f| f.id == feature_id) {
                Some(idx) => {
                    result = Ok(service.features.remove(idx));
                    true
                }
                None => {
                    result = Err(CatalogError::UnknownFeature {
                        service: service_id.to_string(),
                        feature: feature_id.to_string(),
                    });
                    false
                }
            }
        });
        result
    }

    /// Sums the service base price and the selected feature prices.
    pub fn estimate(&self, service_id: &str, feature_ids: &[&str]) -> Result<Estimate, CatalogError> {
        let catalog = self.sender.borrow();
        let service = catalog
            .service(service_id)
            .ok_or_else(|| CatalogError::UnknownService(service_id.to_string()))?;

        let features = feature_ids
            .iter()
            .map(|id| {
                service
                    .feature(id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownFeature {
                        service: service_id.to_string(),
                        feature: (*id).to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = features
            .iter()
            .try_fold(service.base_price, |acc, f| acc.checked_add(f.price))
            .ok_or_else(|| CatalogError::PriceOverflow(service_id.to_string()))?;
        Ok(Estimate {
            service: service.id.clone(),
            base_price: service.base_price,
            features,
            total,
        })
    }
}
