use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub bind_addr: String,
    pub storage_path: String,
    pub page_size: usize,
    pub lead_fetch_limit: usize,
    pub request_timeout: Duration,
    pub geolocation_timeout: Duration,
    pub geocoder_url: String,
    pub office_lat: f64,
    pub office_long: f64,
    pub timezone: String,
    pub outbox_flush_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = get("API_BASE_URL")
            .ok_or(ConfigError::Missing("API_BASE_URL"))?
            .trim_end_matches('/')
            .to_string();

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let timezone = get("APP_TIMEZONE").unwrap_or_else(|| "Asia/Kolkata".to_string());
        if crate::time_utils::normalize_timezone(&timezone).is_none() {
            return Err(ConfigError::Invalid {
                key: "APP_TIMEZONE",
                value: timezone,
            });
        }

        let page_size = parse_or(&get, "PAGE_SIZE", 10usize)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            api_base_url,
            bind_addr,
            storage_path: get("STORAGE_PATH").unwrap_or_else(|| "bharat_crm_storage.json".to_string()),
            page_size,
            lead_fetch_limit: parse_or(&get, "LEAD_FETCH_LIMIT", 1000usize)?,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30u64)?),
            geolocation_timeout: Duration::from_secs(parse_or(&get, "GEOLOCATION_TIMEOUT_SECS", 10u64)?),
            geocoder_url: get("GEOCODER_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string())
                .trim_end_matches('/')
                .to_string(),
            office_lat: parse_or(&get, "OFFICE_LAT", 0.0f64)?,
            office_long: parse_or(&get, "OFFICE_LONG", 0.0f64)?,
            timezone,
            outbox_flush_cron: get("OUTBOX_FLUSH_CRON").unwrap_or_else(|| "0 * * * * *".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
