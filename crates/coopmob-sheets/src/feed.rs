// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Published city/listing catalog.
//!
//! The cooperative maintains the vacancy sheet by hand and publishes it as
//! CSV. Rows and header names are taken as-is; a row is *open* when its
//! STATUS is `aberto` and the remaining-slots cell is absent, non-numeric,
//! or at least 1. The parsed snapshot is cached and served stale when a
//! refetch fails, so a flaky sheet never empties an already-working menu.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use coopmob_core::{CatalogPort, CoopmobError, Listing};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Base URL for the published-sheet CSV export.
const EXPORT_BASE_URL: &str = "https://docs.google.com";

/// One raw sheet row. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "CIDADE", default)]
    cidade: String,
    #[serde(rename = "STATUS", default)]
    status: String,
    #[serde(rename = "VAGAS_RESTANTES", default)]
    vagas_restantes: Option<String>,
    #[serde(rename = "TURNO", default)]
    turno: String,
    #[serde(rename = "VAGA_ID", default)]
    vaga_id: String,
    #[serde(rename = "FARMACIA", default)]
    farmacia: String,
    #[serde(rename = "TAXA_ENTREGA", default)]
    taxa_entrega: String,
}

/// An open row, city alongside its listing.
#[derive(Debug, Clone)]
struct OpenRow {
    cidade: String,
    listing: Listing,
}

/// Parsed catalog state at one fetch instant.
struct Snapshot {
    fetched_at: Instant,
    rows: Vec<OpenRow>,
    cities: Vec<String>,
    /// trimmed-lowercased label -> canonical label
    city_index: HashMap<String, String>,
}

/// CSV-backed catalog of cities and open vacancy listings.
pub struct CityCatalog {
    client: reqwest::Client,
    sheet_id: String,
    gid: String,
    cache_ttl: Duration,
    cache: RwLock<Option<Arc<Snapshot>>>,
    base_url: String,
}

impl CityCatalog {
    pub fn new(sheet_id: String, gid: String, cache_ttl: Duration) -> Result<Self, CoopmobError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| CoopmobError::Catalog {
                message: format!("reqwest client construction failed: {e}"),
            })?;

        Ok(Self {
            client,
            sheet_id,
            gid,
            cache_ttl,
            cache: RwLock::new(None),
            base_url: EXPORT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a local mock server instead of the live API.
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn csv_url(&self) -> String {
        format!(
            "{}/spreadsheets/d/{}/export?format=csv&gid={}",
            self.base_url, self.sheet_id, self.gid
        )
    }

    /// Returns a current snapshot, refetching when the cache expired.
    ///
    /// A fetch failure keeps serving the previous snapshot; only a failure
    /// with nothing cached surfaces as an error.
    async fn snapshot(&self) -> Result<Arc<Snapshot>, CoopmobError> {
        if let Some(snapshot) = self.cache.read().await.as_ref() {
            if snapshot.fetched_at.elapsed() < self.cache_ttl {
                return Ok(Arc::clone(snapshot));
            }
        }

        match self.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.cache.write().await = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(error) => {
                if let Some(stale) = self.cache.read().await.as_ref() {
                    warn!(error = %error, "catalog refetch failed; serving stale snapshot");
                    return Ok(Arc::clone(stale));
                }
                Err(error)
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, CoopmobError> {
        let url = self.csv_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoopmobError::Catalog {
                message: format!("catalog fetch failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoopmobError::Catalog {
                message: format!("catalog fetch returned {status}"),
            });
        }

        let body = response.text().await.map_err(|e| CoopmobError::Catalog {
            message: format!("failed to read catalog body: {e}"),
        })?;

        let snapshot = parse_catalog(&body)?;
        debug!(
            rows = snapshot.rows.len(),
            cities = snapshot.cities.len(),
            "catalog refreshed"
        );
        Ok(snapshot)
    }
}

fn parse_catalog(csv_body: &str) -> Result<Snapshot, CoopmobError> {
    let mut reader = csv::Reader::from_reader(csv_body.as_bytes());
    let mut rows = Vec::new();

    for result in reader.deserialize::<RawRow>() {
        let raw = result.map_err(|e| CoopmobError::Catalog {
            message: format!("malformed catalog row: {e}"),
        })?;
        if !row_is_open(&raw) {
            continue;
        }
        let cidade = raw.cidade.trim().to_string();
        if cidade.is_empty() {
            continue;
        }
        rows.push(OpenRow {
            cidade,
            listing: Listing {
                vaga_id: raw.vaga_id.trim().to_string(),
                farmacia: raw.farmacia.trim().to_string(),
                turno: raw.turno.trim().to_string(),
                taxa_entrega: raw.taxa_entrega.trim().to_string(),
                vagas_restantes: raw.vagas_restantes,
            },
        });
    }

    let cities: Vec<String> = rows
        .iter()
        .map(|row| row.cidade.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let city_index = cities
        .iter()
        .map(|city| (city.trim().to_lowercase(), city.clone()))
        .collect();

    Ok(Snapshot {
        fetched_at: Instant::now(),
        rows,
        cities,
        city_index,
    })
}

fn row_is_open(row: &RawRow) -> bool {
    if row.status.trim().to_lowercase() != "aberto" {
        return false;
    }
    slots_available(row.vagas_restantes.as_deref())
}

/// Absent or non-numeric slot counts are treated as available; the sheet is
/// hand-maintained and the column is often left blank.
fn slots_available(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => match value.trim().parse::<f64>() {
            Ok(count) => count >= 1.0,
            Err(_) => true,
        },
    }
}

#[async_trait]
impl CatalogPort for CityCatalog {
    async fn open_cities(&self) -> Result<Vec<String>, CoopmobError> {
        Ok(self.snapshot().await?.cities.clone())
    }

    async fn match_city(&self, label: &str) -> Result<Option<String>, CoopmobError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .city_index
            .get(&label.trim().to_lowercase())
            .cloned())
    }

    async fn listings_for(&self, city: &str) -> Result<Vec<Listing>, CoopmobError> {
        let snapshot = self.snapshot().await?;
        let needle = city.trim().to_lowercase();
        Ok(snapshot
            .rows
            .iter()
            .filter(|row| row.cidade.to_lowercase() == needle)
            .map(|row| row.listing.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CSV_FIXTURE: &str = "\
CIDADE,STATUS,VAGAS_RESTANTES,TURNO,VAGA_ID,FARMACIA,TAXA_ENTREGA
São Paulo,Aberto,3,Manhã,V001,Farmácia Central,\"R$ 7,00\"
São Paulo,Aberto,,Tarde,V002,Farmácia Norte,\"R$ 7,50\"
Campinas,aberto,indefinido,Noite,V003,Farmácia Sul,\"R$ 8,00\"
Santos,Fechado,5,Manhã,V004,Farmácia Porto,\"R$ 6,00\"
Sorocaba,Aberto,0,Manhã,V005,Farmácia Oeste,\"R$ 6,50\"
";

    fn catalog(base_url: &str, ttl: Duration) -> CityCatalog {
        CityCatalog::new("sheet-test".into(), "0".into(), ttl)
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    async fn mount_csv(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/sheet-test/export"))
            .and(query_param("format", "csv"))
            .and(query_param("gid", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn open_cities_filters_sorts_and_dedups() {
        let server = MockServer::start().await;
        mount_csv(&server, CSV_FIXTURE).await;

        let catalog = catalog(&server.uri(), Duration::from_secs(600));
        let cities = catalog.open_cities().await.unwrap();

        // Santos is closed; Sorocaba has zero slots; São Paulo appears once.
        assert_eq!(cities, vec!["Campinas", "São Paulo"]);
    }

    #[tokio::test]
    async fn non_numeric_slots_count_as_available() {
        let server = MockServer::start().await;
        mount_csv(&server, CSV_FIXTURE).await;

        let catalog = catalog(&server.uri(), Duration::from_secs(600));
        let listings = catalog.listings_for("Campinas").await.unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].vaga_id, "V003");
    }

    #[tokio::test]
    async fn match_city_is_case_insensitive_and_exact() {
        let server = MockServer::start().await;
        mount_csv(&server, CSV_FIXTURE).await;

        let catalog = catalog(&server.uri(), Duration::from_secs(600));

        assert_eq!(
            catalog.match_city("são paulo").await.unwrap(),
            Some("São Paulo".to_string())
        );
        assert_eq!(
            catalog.match_city("  SÃO PAULO  ").await.unwrap(),
            Some("São Paulo".to_string())
        );
        // Substrings must not match.
        assert_eq!(catalog.match_city("São").await.unwrap(), None);
        assert_eq!(catalog.match_city("Paulo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn listings_for_returns_all_open_rows_of_city() {
        let server = MockServer::start().await;
        mount_csv(&server, CSV_FIXTURE).await;

        let catalog = catalog(&server.uri(), Duration::from_secs(600));
        let listings = catalog.listings_for("São Paulo").await.unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].vaga_id, "V001");
        assert_eq!(listings[0].turno, "Manhã");
        assert_eq!(listings[0].taxa_entrega, "R$ 7,00");
        assert_eq!(listings[1].vaga_id, "V002");
    }

    #[tokio::test]
    async fn stale_snapshot_survives_refetch_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/sheet-test/export"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CSV_FIXTURE.to_string()))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/sheet-test/export"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // Zero TTL forces a refetch on the second call.
        let catalog = catalog(&server.uri(), Duration::ZERO);

        let first = catalog.open_cities().await.unwrap();
        assert_eq!(first, vec!["Campinas", "São Paulo"]);

        let second = catalog.open_cities().await.unwrap();
        assert_eq!(second, first, "stale snapshot should be served");
    }

    #[tokio::test]
    async fn first_fetch_failure_surfaces_as_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/d/sheet-test/export"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let catalog = catalog(&server.uri(), Duration::from_secs(600));
        assert!(catalog.open_cities().await.is_err());
    }
}
