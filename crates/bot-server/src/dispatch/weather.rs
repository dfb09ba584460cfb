use shared::line::LineMessage;
use shared::weather::WeatherError;

use super::{ActionResult, replies};
use crate::http::AppState;

pub(super) async fn forecast(state: &AppState, location: Option<String>) -> ActionResult {
    let location = location.unwrap_or_else(|| state.settings.default_weather_location.clone());

    match state.weather.forecast(&location).await {
        Ok(forecast) => Ok(vec![LineMessage::text(forecast.format())]),
        Err(WeatherError::LocationNotFound(name)) => {
            Ok(vec![LineMessage::text(replies::unknown_location(&name))])
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn earthquake(state: &AppState) -> ActionResult {
    let report = state.weather.latest_earthquake().await?;

    let mut messages = vec![LineMessage::text(report.format())];
    if let Some(image_url) = report.image_url.as_deref() {
        messages.push(LineMessage::image(image_url));
    }
    Ok(messages)
}
