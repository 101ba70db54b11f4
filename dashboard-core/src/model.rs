use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::weather_code::{Descriptor, describe};

/// Timezone value that asks the forecast provider to resolve it from coordinates.
pub const AUTO_TIMEZONE: &str = "auto";

/// A resolved place. Two locations denote the same place when their
/// coordinates are equal, regardless of name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub timezone: String,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn same_place(&self, other: &Location) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// "Paris, France", or just the name when the country is unknown.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parameters of a single forecast call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// `None` is sent as `"auto"`.
    pub timezone: Option<String>,
    pub past_days: Option<u8>,
    pub forecast_days: Option<u8>,
}

impl ForecastRequest {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, timezone: None, past_days: None, forecast_days: None }
    }

    pub fn for_location(location: &Location) -> Self {
        Self {
            timezone: Some(location.timezone.clone()),
            ..Self::new(location.latitude, location.longitude)
        }
    }

    pub fn with_days(mut self, past_days: Option<u8>, forecast_days: Option<u8>) -> Self {
        self.past_days = past_days;
        self.forecast_days = forecast_days;
        self
    }

    pub fn timezone_or_auto(&self) -> &str {
        self.timezone.as_deref().filter(|tz| !tz.is_empty()).unwrap_or(AUTO_TIMEZONE)
    }
}

/// Conditions at observation time, as reported under `current_weather`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentConditions {
    /// °C
    pub temperature: f64,
    /// km/h
    #[serde(rename = "windspeed")]
    pub wind_speed: f64,
    /// Degrees, meteorological convention (direction the wind blows from).
    #[serde(rename = "winddirection")]
    pub wind_direction: f64,
    #[serde(rename = "weathercode")]
    pub weather_code: i32,
    #[serde(rename = "time", deserialize_with = "deserialize_local_minute")]
    pub observed_at: NaiveDateTime,
}

impl CurrentConditions {
    pub fn descriptor(&self) -> Descriptor {
        describe(self.weather_code)
    }
}

/// The forecast series broke the co-indexing invariant.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("{series} series `{field}` has {actual} entries, expected {expected}")]
    LengthMismatch { series: &'static str, field: &'static str, expected: usize, actual: usize },

    #[error("invalid timestamp `{0}` in forecast series")]
    Timestamp(String),
}

/// Hourly forecast as parallel arrays. Every array has the same length and
/// position `i` in each describes the same hour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawHourly")]
pub struct HourlySeries {
    time: Vec<NaiveDateTime>,
    temperature: Vec<Option<f64>>,
    relative_humidity: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    wind_speed: Vec<Option<f64>>,
    wind_direction: Vec<Option<f64>>,
}

/// One row of [`HourlySeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<i32>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

impl HourlyPoint {
    pub fn descriptor(&self) -> Descriptor {
        describe(self.weather_code.unwrap_or(-1))
    }
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<HourlyPoint> {
        Some(HourlyPoint {
            time: *self.time.get(index)?,
            temperature: self.temperature[index],
            relative_humidity: self.relative_humidity[index],
            precipitation_probability: self.precipitation_probability[index],
            precipitation: self.precipitation[index],
            weather_code: self.weather_code[index],
            wind_speed: self.wind_speed[index],
            wind_direction: self.wind_direction[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = HourlyPoint> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// The first `hours` rows of the series.
    pub fn upcoming(&self, hours: usize) -> impl Iterator<Item = HourlyPoint> + '_ {
        self.iter().take(hours)
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn temperature(&self) -> &[Option<f64>] {
        &self.temperature
    }

    pub fn relative_humidity(&self) -> &[Option<f64>] {
        &self.relative_humidity
    }

    pub fn precipitation_probability(&self) -> &[Option<f64>] {
        &self.precipitation_probability
    }

    pub fn precipitation(&self) -> &[Option<f64>] {
        &self.precipitation
    }

    pub fn weather_code(&self) -> &[Option<i32>] {
        &self.weather_code
    }

    pub fn wind_speed(&self) -> &[Option<f64>] {
        &self.wind_speed
    }

    pub fn wind_direction(&self) -> &[Option<f64>] {
        &self.wind_direction
    }
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relativehumidity_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    weathercode: Vec<Option<i32>>,
    windspeed_10m: Vec<Option<f64>>,
    winddirection_10m: Vec<Option<f64>>,
}

impl TryFrom<RawHourly> for HourlySeries {
    type Error = SeriesError;

    fn try_from(raw: RawHourly) -> Result<Self, Self::Error> {
        let expected = raw.time.len();
        let check = |field, actual| check_len("hourly", field, expected, actual);
        check("temperature_2m", raw.temperature_2m.len())?;
        check("relativehumidity_2m", raw.relativehumidity_2m.len())?;
        check("precipitation_probability", raw.precipitation_probability.len())?;
        check("precipitation", raw.precipitation.len())?;
        check("weathercode", raw.weathercode.len())?;
        check("windspeed_10m", raw.windspeed_10m.len())?;
        check("winddirection_10m", raw.winddirection_10m.len())?;

        let time = raw
            .time
            .iter()
            .map(|t| parse_local_minute(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            time,
            temperature: raw.temperature_2m,
            relative_humidity: raw.relativehumidity_2m,
            precipitation_probability: raw.precipitation_probability,
            precipitation: raw.precipitation,
            weather_code: raw.weathercode,
            wind_speed: raw.windspeed_10m,
            wind_direction: raw.winddirection_10m,
        })
    }
}

/// Daily forecast as parallel arrays, co-indexed like [`HourlySeries`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDaily")]
pub struct DailySeries {
    time: Vec<NaiveDate>,
    weather_code: Vec<Option<i32>>,
    temperature_max: Vec<Option<f64>>,
    temperature_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
}

/// One row of [`DailySeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub weather_code: Option<i32>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub precipitation_probability_max: Option<f64>,
}

impl DailyPoint {
    pub fn descriptor(&self) -> Descriptor {
        describe(self.weather_code.unwrap_or(-1))
    }
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<DailyPoint> {
        Some(DailyPoint {
            date: *self.time.get(index)?,
            weather_code: self.weather_code[index],
            temperature_max: self.temperature_max[index],
            temperature_min: self.temperature_min[index],
            precipitation_sum: self.precipitation_sum[index],
            precipitation_probability_max: self.precipitation_probability_max[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = DailyPoint> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    pub fn time(&self) -> &[NaiveDate] {
        &self.time
    }

    pub fn weather_code(&self) -> &[Option<i32>] {
        &self.weather_code
    }

    pub fn temperature_max(&self) -> &[Option<f64>] {
        &self.temperature_max
    }

    pub fn temperature_min(&self) -> &[Option<f64>] {
        &self.temperature_min
    }

    pub fn precipitation_sum(&self) -> &[Option<f64>] {
        &self.precipitation_sum
    }

    pub fn precipitation_probability_max(&self) -> &[Option<f64>] {
        &self.precipitation_probability_max
    }
}

#[derive(Debug, Deserialize)]
struct RawDaily {
    time: Vec<String>,
    weathercode: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
}

impl TryFrom<RawDaily> for DailySeries {
    type Error = SeriesError;

    fn try_from(raw: RawDaily) -> Result<Self, Self::Error> {
        let expected = raw.time.len();
        let check = |field, actual| check_len("daily", field, expected, actual);
        check("weathercode", raw.weathercode.len())?;
        check("temperature_2m_max", raw.temperature_2m_max.len())?;
        check("temperature_2m_min", raw.temperature_2m_min.len())?;
        check("precipitation_sum", raw.precipitation_sum.len())?;
        check("precipitation_probability_max", raw.precipitation_probability_max.len())?;

        let time = raw
            .time
            .iter()
            .map(|t| {
                NaiveDate::parse_from_str(t, "%Y-%m-%d")
                    .map_err(|_| SeriesError::Timestamp(t.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            time,
            weather_code: raw.weathercode,
            temperature_max: raw.temperature_2m_max,
            temperature_min: raw.temperature_2m_min,
            precipitation_sum: raw.precipitation_sum,
            precipitation_probability_max: raw.precipitation_probability_max,
        })
    }
}

/// A complete forecast response. Replaces any previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub timezone_abbreviation: String,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(rename = "current_weather")]
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

/// 8-point compass label for a wind direction in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = degrees.rem_euclid(360.0);
    let sector = ((normalized + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[sector]
}

fn check_len(
    series: &'static str,
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), SeriesError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SeriesError::LengthMismatch { series, field, expected, actual })
    }
}

/// The provider reports local times without an offset and usually without seconds.
fn parse_local_minute(value: &str) -> Result<NaiveDateTime, SeriesError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| SeriesError::Timestamp(value.to_string()))
}

fn deserialize_local_minute<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_local_minute(&raw).map_err(serde::de::Error::custom)
}
