//! OpenWeatherMap current conditions and forecast

use alloc::format;
use alloc::string::String;

use serde_json::Value;

use super::http::Request;
use super::FeedError;

/// Seconds between refreshes
pub const REFRESH_SECS: u64 = 900;

/// Seconds to wait after a failed fetch
pub const RETRY_SECS: u64 = 60;

/// Seconds between two showings of the same report
pub const REDISPLAY_SECS: u64 = 20;

const CURRENT_TEMP: &str = "/main/temp";
const FORECAST_TEMP: &str = "/list/2/main/temp";
const FORECAST_DESCRIPTION: &str = "/list/2/weather/0/description";
const CITY_NAME: &str = "/city/name";

/// Current conditions for `city_id`, in metric units
pub fn current_request(city_id: &str, api_key: &str) -> Request {
    Request::get(format!(
        "http://api.openweathermap.org/data/2.5/weather?id={}&appid={}&units=metric",
        city_id, api_key
    ))
}

/// Three-hourly forecast for `city_id`, in metric units
///
/// Only the first three slots are requested; the report uses the third.
pub fn forecast_request(city_id: &str, api_key: &str) -> Request {
    Request::get(format!(
        "http://api.openweathermap.org/data/2.5/forecast?id={}&appid={}&units=metric&cnt=3",
        city_id, api_key
    ))
}

/// Forecast fields used in the report
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub city: String,
    /// Temperature six hours ahead, in °C
    pub temp: f64,
    pub description: String,
}

/// Current temperature in °C
pub fn parse_current(body: &str) -> Result<f64, FeedError> {
    let doc: Value = serde_json::from_str(body)?;
    number_at(&doc, CURRENT_TEMP)
}

pub fn parse_forecast(body: &str) -> Result<Forecast, FeedError> {
    let doc: Value = serde_json::from_str(body)?;
    Ok(Forecast {
        city: text_at(&doc, CITY_NAME)?,
        temp: number_at(&doc, FORECAST_TEMP)?,
        description: text_at(&doc, FORECAST_DESCRIPTION)?,
    })
}

/// `"{city}: {now}C ({later}C, {description})"`
pub fn report(current: f64, forecast: &Forecast) -> String {
    format!(
        "{}: {:.1}C ({:.1}C, {})",
        forecast.city, current, forecast.temp, forecast.description
    )
}

fn number_at(doc: &Value, pointer: &str) -> Result<f64, FeedError> {
    doc.pointer(pointer)
        .and_then(Value::as_f64)
        .ok_or(FeedError::MissingField)
}

fn text_at(doc: &Value, pointer: &str) -> Result<String, FeedError> {
    doc.pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(FeedError::MissingField)
}
