//! Central Weather Administration open data client.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const FORECAST_DATASET: &str = "F-C0032-001";
const EARTHQUAKE_DATASET: &str = "E-A0016-001";

/// County and city names accepted by the forecast dataset. Cities come before
/// counties sharing the same short name.
pub const LOCATIONS: [&str; 22] = [
    "臺北市", "新北市", "桃園市", "臺中市", "臺南市", "高雄市", "基隆市", "新竹市", "嘉義市",
    "新竹縣", "苗栗縣", "彰化縣", "南投縣", "雲林縣", "嘉義縣", "屏東縣", "宜蘭縣", "花蓮縣",
    "臺東縣", "澎湖縣", "金門縣", "連江縣",
];

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Transport(String),
    #[error("weather api returned status {status}")]
    Api { status: u16 },
    #[error("weather api returned an invalid payload: {0}")]
    InvalidResponse(String),
    #[error("no forecast for location {0}")]
    LocationNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub location: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: String,
    pub rain_probability: String,
    pub min_temperature: String,
    pub max_temperature: String,
    pub comfort: String,
}

impl Forecast {
    pub fn format(&self) -> String {
        let mut lines = vec![format!("{} 天氣預報", self.location)];
        if let (Some(start), Some(end)) = (&self.start_time, &self.end_time) {
            lines.push(format!("時段：{start} ~ {end}"));
        }
        lines.push(format!("天氣：{}", self.description));
        lines.push(format!("降雨機率：{}%", self.rain_probability));
        lines.push(format!(
            "溫度：{}°C ~ {}°C",
            self.min_temperature, self.max_temperature
        ));
        lines.push(format!("舒適度：{}", self.comfort));
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeReport {
    pub content: String,
    pub origin_time: String,
    pub magnitude: Option<f64>,
    pub epicenter: String,
    pub depth_km: Option<f64>,
    pub image_url: Option<String>,
    pub web_url: Option<String>,
}

impl EarthquakeReport {
    pub fn format(&self) -> String {
        let mut lines = vec!["最新地震報告".to_string(), self.content.clone()];
        lines.push(format!("發生時間：{}", self.origin_time));
        if let Some(magnitude) = self.magnitude {
            lines.push(format!("規模：{magnitude:.1}"));
        }
        lines.push(format!("震央：{}", self.epicenter));
        if let Some(depth) = self.depth_km {
            lines.push(format!("深度：{depth:.1} 公里"));
        }
        if let Some(web_url) = &self.web_url {
            lines.push(web_url.clone());
        }
        lines.join("\n")
    }
}

#[derive(Clone)]
pub struct WeatherClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: String, api_key: String, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    pub async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError> {
        let location = normalize_location(location);
        let response: ForecastResponse = self
            .fetch(FORECAST_DATASET, &[("locationName", location.as_str())])
            .await?;

        let entry = response
            .records
            .location
            .into_iter()
            .find(|entry| entry.location_name == location)
            .ok_or_else(|| WeatherError::LocationNotFound(location.clone()))?;

        let element = |name: &str| {
            entry
                .weather_element
                .iter()
                .find(|element| element.element_name == name)
                .and_then(|element| element.time.first())
        };

        let description = element("Wx").ok_or_else(|| {
            WeatherError::InvalidResponse(format!("missing Wx for {location}"))
        })?;
        let value_of = |name: &str| {
            element(name)
                .map(|period| period.parameter.parameter_name.clone())
                .unwrap_or_else(|| "-".to_string())
        };

        Ok(Forecast {
            location: entry.location_name.clone(),
            start_time: description.start_time.clone(),
            end_time: description.end_time.clone(),
            description: description.parameter.parameter_name.clone(),
            rain_probability: value_of("PoP"),
            min_temperature: value_of("MinT"),
            max_temperature: value_of("MaxT"),
            comfort: value_of("CI"),
        })
    }

    pub async fn latest_earthquake(&self) -> Result<EarthquakeReport, WeatherError> {
        let response: EarthquakeResponse = self.fetch(EARTHQUAKE_DATASET, &[("limit", "1")]).await?;

        let quake = response
            .records
            .earthquake
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::InvalidResponse("no earthquake records".to_string()))?;

        Ok(EarthquakeReport {
            content: quake.report_content,
            origin_time: quake.earthquake_info.origin_time,
            magnitude: quake
                .earthquake_info
                .earthquake_magnitude
                .and_then(|magnitude| magnitude.magnitude_value),
            epicenter: quake
                .earthquake_info
                .epicenter
                .map(|epicenter| epicenter.location)
                .unwrap_or_default(),
            depth_km: quake.earthquake_info.focal_depth,
            image_url: quake.report_image_uri.filter(|url| !url.is_empty()),
            web_url: quake.web.filter(|url| !url.is_empty()),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        dataset: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(format!("{}/{dataset}", self.base_url))
            .query(&[("Authorization", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|err| WeatherError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| WeatherError::InvalidResponse(err.to_string()))
    }
}

/// The dataset only knows the `臺` spelling.
pub fn normalize_location(location: &str) -> String {
    location.trim().replace('台', "臺")
}

/// Finds a county or city name in free text. Short names such as `台北` map to
/// the first matching entry of [`LOCATIONS`].
pub fn extract_location(text: &str) -> Option<&'static str> {
    let normalized = normalize_location(text);

    LOCATIONS
        .iter()
        .find(|location| normalized.contains(*location))
        .or_else(|| {
            LOCATIONS.iter().find(|location| {
                let short = location.chars().take(2).collect::<String>();
                normalized.contains(&short)
            })
        })
        .copied()
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    records: ForecastRecords,
}

#[derive(Debug, Deserialize)]
struct ForecastRecords {
    #[serde(default)]
    location: Vec<ForecastLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastLocation {
    location_name: String,
    #[serde(default)]
    weather_element: Vec<WeatherElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherElement {
    element_name: String,
    #[serde(default)]
    time: Vec<WeatherPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherPeriod {
    start_time: Option<String>,
    end_time: Option<String>,
    parameter: WeatherParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherParameter {
    parameter_name: String,
}

#[derive(Debug, Deserialize)]
struct EarthquakeResponse {
    records: EarthquakeRecords,
}

#[derive(Debug, Deserialize)]
struct EarthquakeRecords {
    #[serde(rename = "Earthquake", default)]
    earthquake: Vec<Earthquake>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Earthquake {
    #[serde(default)]
    report_content: String,
    #[serde(rename = "ReportImageURI")]
    report_image_uri: Option<String>,
    web: Option<String>,
    earthquake_info: EarthquakeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EarthquakeInfo {
    #[serde(default)]
    origin_time: String,
    focal_depth: Option<f64>,
    epicenter: Option<Epicenter>,
    earthquake_magnitude: Option<EarthquakeMagnitude>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Epicenter {
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EarthquakeMagnitude {
    magnitude_value: Option<f64>,
}
