//! Official PAGASA weather advisories
//!
//! Scrapes the advisory page and picks out the entries relevant to a
//! place. Both operations always produce at least one line of text.

use reqwest_middleware::ClientWithMiddleware;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use crate::{Result, WeatherPhError};

pub const LOAD_FAILED: &str = "Unable to load official advisories.";
pub const NO_ADVISORY: &str = "No official hazard/advisory for this location.";

const ADVISORY_SELECTOR: &str = ".advisory-content, .advisory-title";
const REGIONS: [&str; 3] = ["luzon", "visayas", "mindanao"];

pub struct OfficialAdvisories {
    http: ClientWithMiddleware,
    url: String,
}

impl OfficialAdvisories {
    pub fn new(http: ClientWithMiddleware, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Every advisory currently on the page
    #[instrument(skip(self))]
    pub async fn load_latest_advisories(&self) -> Result<Vec<String>> {
        let html = self.download().await?;
        let advisories = extract_advisories(&html);
        debug!("Found {} official advisories", advisories.len());
        Ok(advisories)
    }

    /// Every advisory currently on the page, or a single failure notice
    pub async fn fetch_latest_advisories(&self) -> Vec<String> {
        self.load_latest_advisories().await.unwrap_or_else(|e| {
            warn!("Failed to load PAGASA advisories: {}", e);
            vec![LOAD_FAILED.to_string()]
        })
    }

    /// Advisories for `location`, or all of them when no place is given.
    /// A page that cannot be loaded yields the failure notice unfiltered.
    pub async fn advisories_for(&self, location: Option<&str>) -> Vec<String> {
        match self.load_latest_advisories().await {
            Ok(advisories) => match location {
                Some(location) => filter_advisories_for_location(&advisories, location),
                None => advisories,
            },
            Err(e) => {
                warn!("Failed to load PAGASA advisories: {}", e);
                vec![LOAD_FAILED.to_string()]
            }
        }
    }

    async fn download(&self) -> Result<String> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherPhError::api(format!(
                "Advisory page returned status {status}"
            )));
        }
        Ok(response.text().await?)
    }
}

/// Text of every advisory title and body, whitespace collapsed
pub fn extract_advisories(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse(ADVISORY_SELECTOR) else {
        return Vec::new();
    };

    doc.select(&selector)
        .map(|el| el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Advisories that mention the place, or share a major island group with it
pub fn filter_advisories_for_location(advisories: &[String], location: &str) -> Vec<String> {
    let place = location.trim().to_lowercase();
    let mut results: Vec<String> = Vec::new();

    for advisory in advisories {
        let text = advisory.to_lowercase();
        let mentions_place = !place.is_empty() && text.contains(&place);
        let same_region = REGIONS
            .iter()
            .any(|region| place.contains(region) && text.contains(region));

        if (mentions_place || same_region) && !results.contains(advisory) {
            results.push(advisory.clone());
        }
    }

    if results.is_empty() {
        results.push(NO_ADVISORY.to_string());
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::build_http_client;
    use crate::config::OpenWeatherConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html><body>
          <div class="advisory">
            <h3 class="advisory-title">Heavy Rainfall Warning No. 3</h3>
            <div class="advisory-content">
              Moderate to heavy rains over   Metro Manila and Bulacan.
            </div>
          </div>
          <div class="advisory">
            <h3 class="advisory-title">Gale Warning</h3>
            <div class="advisory-content">Rough seas over the eastern seaboard of Mindanao.</div>
          </div>
          <p class="footer">Not an advisory</p>
        </body></html>
    "#;

    fn advisories(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_advisories() {
        let found = extract_advisories(PAGE);
        assert_eq!(
            found,
            advisories(&[
                "Heavy Rainfall Warning No. 3",
                "Moderate to heavy rains over Metro Manila and Bulacan.",
                "Gale Warning",
                "Rough seas over the eastern seaboard of Mindanao.",
            ])
        );
    }

    #[test]
    fn test_extract_from_page_without_advisories() {
        assert!(extract_advisories("<html><body><p>maintenance</p></body></html>").is_empty());
    }

    #[test]
    fn test_filter_by_place_name() {
        let found = extract_advisories(PAGE);
        assert_eq!(
            filter_advisories_for_location(&found, "Bulacan"),
            advisories(&["Moderate to heavy rains over Metro Manila and Bulacan."])
        );
    }

    #[test]
    fn test_region_match_is_not_duplicated() {
        let found = advisories(&["Rain over Northern Mindanao", "Rain over Luzon"]);
        assert_eq!(
            filter_advisories_for_location(&found, "Mindanao"),
            advisories(&["Rain over Northern Mindanao"])
        );
        assert_eq!(
            filter_advisories_for_location(&found, "Northern Luzon"),
            advisories(&["Rain over Luzon"])
        );
    }

    #[test]
    fn test_no_match_gives_notice() {
        let found = advisories(&["Gale warning over Visayas"]);
        assert_eq!(
            filter_advisories_for_location(&found, "Baguio"),
            advisories(&[NO_ADVISORY])
        );
        assert_eq!(
            filter_advisories_for_location(&[], "   "),
            advisories(&[NO_ADVISORY])
        );
    }

    fn client_for(url: &str) -> OfficialAdvisories {
        let http = build_http_client(&OpenWeatherConfig {
            max_retries: 0,
            ..OpenWeatherConfig::default()
        })
        .unwrap();
        OfficialAdvisories::new(http, url)
    }

    #[tokio::test]
    async fn test_fetch_latest_advisories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let found = client_for(&server.uri()).fetch_latest_advisories().await;
        assert_eq!(found.len(), 4);
        assert_eq!(found[2], "Gale Warning");
    }

    #[tokio::test]
    async fn test_unreachable_page_is_not_filtered_away() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let official = client_for(&server.uri());

        assert!(official.load_latest_advisories().await.is_err());
        assert_eq!(
            official.fetch_latest_advisories().await,
            advisories(&[LOAD_FAILED])
        );
        assert_eq!(
            official.advisories_for(Some("Cavite")).await,
            advisories(&[LOAD_FAILED])
        );
    }
}
