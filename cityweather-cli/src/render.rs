//! Plain-text rendering of the fetch state.

use cityweather_core::{FetchState, PresentationBucket, Theme, WeatherReading, classify};

pub fn welcome() -> String {
    [
        "Welcome to cityweather",
        "Enter a city name to get the current weather information.",
        "Press Enter on an empty line or Esc to quit.",
    ]
    .join("\n")
}

pub fn fetch_state(state: &FetchState, theme: Theme) -> String {
    match state {
        FetchState::Idle => String::new(),
        FetchState::Loading => "Loading...".to_string(),
        FetchState::Failure(message) => error_banner(message, theme),
        FetchState::Success(reading) => reading_panel(reading, theme),
    }
}

fn error_banner(message: &str, theme: Theme) -> String {
    let backdrop = PresentationBucket::Default.backdrop(theme);
    format!("Error: {message}\n[backdrop: {backdrop}]")
}

fn reading_panel(reading: &WeatherReading, theme: Theme) -> String {
    let bucket = classify(&reading.condition_text, reading.is_day);

    let mut lines = vec![reading.display_location()];
    if !reading.local_time.is_empty() {
        lines.push(reading.local_time.clone());
    }
    lines.push(String::new());
    lines.push(format!("{:.1}°C  {}", reading.temperature_c, reading.condition_text));
    lines.push(format!("Feels like: {:.1}°C", reading.feels_like_c));
    lines.push(format!("Humidity:   {}%", reading.humidity_pct));
    lines.push(format!("Wind:       {:.1} km/h", reading.wind_kph));
    if let Some(clouds) = reading.clouds_pct {
        lines.push(format!("Clouds:     {clouds}%"));
    }
    lines.push(if reading.is_day { "Day" } else { "Night" }.to_string());
    if let Some(icon) = &reading.icon_url {
        lines.push(format!("Icon:       {icon}"));
    }
    lines.push(format!("[{bucket} backdrop: {}]", bucket.backdrop(theme)));

    lines.join("\n")
}
