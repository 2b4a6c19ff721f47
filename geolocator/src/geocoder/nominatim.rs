//! HTTP reverse geocoder for Nominatim-compatible `/reverse` endpoints.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;

use super::types::{GeocodeError, GeocodingService};
use crate::location::Address;

/// Public OpenStreetMap Nominatim reverse endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Default HTTP timeout for one lookup.
pub const DEFAULT_GEOCODER_TIMEOUT: Duration = Duration::from_secs(10);

/// Nominatim's usage policy requires an identifying user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("geolocator/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`NominatimGeocoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatimConfig {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NOMINATIM_URL.to_string(),
            timeout: DEFAULT_GEOCODER_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `/reverse?format=jsonv2&addressdetails=1` response body.
///
/// Only the fields we map are deserialized.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<AddressDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressDetails {
    house_number: Option<String>,
    road: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl ReverseResponse {
    fn into_address(self) -> Option<Address> {
        if self.error.is_some() {
            return None;
        }

        let Some(details) = self.address else {
            // No structure to work with, keep the display name as one line.
            return self.display_name.map(|name| Address {
                lines: vec![name],
                ..Default::default()
            });
        };

        let street = match (details.house_number, details.road) {
            (Some(number), Some(road)) => Some(format!("{} {}", road, number)),
            (None, Some(road)) => Some(road),
            _ => None,
        };
        let district = details.neighbourhood.or(details.suburb);
        let locality = details
            .city
            .or(details.town)
            .or(details.village)
            .or(details.hamlet);

        Some(Address {
            lines: street.into_iter().chain(district).collect(),
            postal_code: details.postcode,
            locality,
            country: details.country,
        })
    }
}

/// Reverse geocoder backed by a Nominatim server.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| GeocodeError::Http(e.to_string()))?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Option<Address>, GeocodeError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| GeocodeError::Http(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GeocodeError::Http(e.to_string()))?;

        let body: ReverseResponse =
            serde_json::from_slice(&bytes).map_err(|e| GeocodeError::Parse(e.to_string()))?;

        if let Some(reason) = &body.error {
            tracing::debug!(latitude, longitude, reason = %reason, "Nominatim found no address");
        }

        Ok(body.into_address())
    }
}

impl GeocodingService for NominatimGeocoder {
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<Address>, GeocodeError>> {
        async move {
            let address = self.fetch(latitude, longitude).await?;
            Ok(address.into_iter().take(max_results).collect())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<Address> {
        serde_json::from_str::<ReverseResponse>(json)
            .unwrap()
            .into_address()
    }

    #[test]
    fn test_maps_structured_address() {
        let json = r#"{
            "place_id": 134069223,
            "lat": "41.1469",
            "lon": "-8.6107",
            "display_name": "14, Rua de Santa Catarina, Bonfim, Porto, 4000-447, Portugal",
            "address": {
                "house_number": "14",
                "road": "Rua de Santa Catarina",
                "suburb": "Bonfim",
                "city": "Porto",
                "county": "Porto",
                "postcode": "4000-447",
                "country": "Portugal",
                "country_code": "pt"
            }
        }"#;

        let address = parse(json).unwrap();
        assert_eq!(
            address.lines,
            vec!["Rua de Santa Catarina 14".to_string(), "Bonfim".to_string()]
        );
        assert_eq!(address.locality.as_deref(), Some("Porto"));
        assert_eq!(address.postal_code.as_deref(), Some("4000-447"));
        assert_eq!(address.country.as_deref(), Some("Portugal"));
    }

    #[test]
    fn test_town_used_when_no_city() {
        let json = r#"{"address": {"road": "Main Street", "town": "Kendal", "country": "United Kingdom"}}"#;

        let address = parse(json).unwrap();
        assert_eq!(address.lines, vec!["Main Street".to_string()]);
        assert_eq!(address.locality.as_deref(), Some("Kendal"));
    }

    #[test]
    fn test_error_body_is_no_address() {
        assert!(parse(r#"{"error": "Unable to geocode"}"#).is_none());
    }

    #[test]
    fn test_display_name_only() {
        let address = parse(r#"{"display_name": "Atlantic Ocean"}"#).unwrap();
        assert_eq!(address.lines, vec!["Atlantic Ocean".to_string()]);
        assert!(address.is_usable());
    }

    #[test]
    fn test_default_config() {
        let config = NominatimConfig::default();
        assert_eq!(config.url, DEFAULT_NOMINATIM_URL);
        assert!(config.user_agent.starts_with("geolocator/"));

        let geocoder = NominatimGeocoder::new(config).unwrap();
        assert_eq!(geocoder.url(), DEFAULT_NOMINATIM_URL);
    }
}
