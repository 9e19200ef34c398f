use crate::domain::models::GeoLocation;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Source of the device position used for attendance punches.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> AppResult<(f64, f64)>;
}

/// Reports a fixed, configured position (the office). `(0, 0)` means unset.
pub struct FixedGeolocator {
    lat: f64,
    long: f64,
}

impl FixedGeolocator {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> AppResult<(f64, f64)> {
        if self.lat == 0.0 && self.long == 0.0 {
            return Err(AppError::Geolocation("no position configured".into()));
        }
        Ok((self.lat, self.long))
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct ReverseGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bharat-crm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn address(&self, lat: f64, long: f64) -> AppResult<String> {
        let resp: ReverseResponse = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", long.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        resp.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Decode("reverse geocoder returned no address".into()))
    }
}

fn coordinates_text(lat: f64, long: f64) -> String {
    format!("{:.6}, {:.6}", lat, long)
}

/// One-shot position lookup bounded by `timeout`. Not retried.
pub async fn acquire_position(geolocator: &dyn Geolocator, timeout: Duration) -> AppResult<(f64, f64)> {
    match tokio::time::timeout(timeout, geolocator.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Geolocation(format!(
            "timed out after {}s",
            timeout.as_secs_f32()
        ))),
    }
}

/// Position plus a human readable address. `reported` coordinates from the
/// device win over the configured geolocator. A failed address lookup falls
/// back to the coordinates as text.
pub async fn resolve_location(
    geolocator: &dyn Geolocator,
    geocoder: &ReverseGeocoder,
    timeout: Duration,
    reported: Option<(f64, f64)>,
) -> AppResult<GeoLocation> {
    let (lat, long) = match reported {
        Some((lat, long)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&long) => (lat, long),
        Some((lat, long)) => {
            return Err(AppError::validation(format!("invalid coordinates {}, {}", lat, long)));
        }
        None => acquire_position(geolocator, timeout).await?,
    };

    let address = match geocoder.address(lat, long).await {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!("Reverse geocoding failed for {}, {}: {}", lat, long, e);
            coordinates_text(lat, long)
        }
    };

    Ok(GeoLocation {
        lat,
        long,
        address: Some(address),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    struct SlowGeolocator;

    #[async_trait]
    impl Geolocator for SlowGeolocator {
        async fn current_position(&self) -> AppResult<(f64, f64)> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok((1.0, 1.0))
        }
    }

    #[tokio::test]
    async fn test_position_timeout() {
        let err = acquire_position(&SlowGeolocator, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, AppError::Geolocation(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_position_fails() {
        let err = acquire_position(&FixedGeolocator::new(0.0, 0.0), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Geolocation(_)));
    }

    #[tokio::test]
    async fn test_address_lookup_and_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reverse")
            .match_query(Matcher::UrlEncoded("format".into(), "json".into()))
            .with_status(200)
            .with_body(r#"{"display_name":"MG Road, Bengaluru"}"#)
            .create_async()
            .await;

        let geocoder = ReverseGeocoder::new(&server.url(), Duration::from_secs(2)).unwrap();
        let office = FixedGeolocator::new(12.9756, 77.6050);
        let location = resolve_location(&office, &geocoder, Duration::from_secs(1), None)
            .await
            .unwrap();
        assert_eq!(location.address.as_deref(), Some("MG Road, Bengaluru"));
        assert_eq!(location.lat, 12.9756);

        let broken = ReverseGeocoder::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let location = resolve_location(&office, &broken, Duration::from_secs(1), Some((19.076, 72.8777)))
            .await
            .unwrap();
        assert_eq!(location.address.as_deref(), Some("19.076000, 72.877700"));
    }

    #[tokio::test]
    async fn test_reported_coordinates_are_checked() {
        let geocoder = ReverseGeocoder::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = resolve_location(&FixedGeolocator::new(0.0, 0.0), &geocoder, Duration::from_secs(1), Some((120.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
