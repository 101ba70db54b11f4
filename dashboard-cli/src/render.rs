//! Plain-text rendering of the dashboard state.

use std::fmt::Write;

use weather_dashboard_core::{
    Location, OrchestratorState, SavedLocationSet, WeatherSnapshot, model::compass_point,
};

/// Hours shown in the hourly strip.
const HOURLY_WINDOW: usize = 24;

pub fn dashboard(state: &OrchestratorState) -> String {
    let mut out = String::new();

    if state.loading {
        out.push_str("Loading weather data...\n");
        return out;
    }

    match (&state.location, &state.weather) {
        (Some(location), Some(weather)) => {
            current(&mut out, location, weather);
            hourly(&mut out, weather);
            daily(&mut out, weather);
        }
        _ if state.error.is_none() => {
            out.push_str("Search for a location or use your current position to see the weather.\n");
        }
        _ => {}
    }

    out
}

fn current(out: &mut String, location: &Location, weather: &WeatherSnapshot) {
    let now = &weather.current;
    let d = now.descriptor();

    let _ = writeln!(out, "{}", location.display_name());
    let _ = writeln!(out, "{}", now.observed_at.format("%A, %B %-d, %Y %H:%M"));
    let _ = writeln!(out, "{} {}°C  {}", d.icon, format_round(now.temperature), d.label);
    let _ = writeln!(
        out,
        "Wind {} km/h from {} ({}°)",
        format_round(now.wind_speed),
        compass_point(now.wind_direction),
        now.wind_direction,
    );

    // The first hourly and daily rows stand in for "now" and "today".
    if let Some(hour) = weather.hourly.get(0) {
        let _ = writeln!(out, "Humidity {}", format_opt(hour.relative_humidity, "%"));
        let _ = writeln!(
            out,
            "Precipitation {} ({} chance)",
            format_opt_mm(hour.precipitation),
            format_opt(hour.precipitation_probability, "%"),
        );
    }
    if let Some(today) = weather.daily.get(0) {
        let _ = writeln!(
            out,
            "Today {} / {}",
            format_opt(today.temperature_max, "°"),
            format_opt(today.temperature_min, "°"),
        );
    }
    out.push('\n');
}

fn hourly(out: &mut String, weather: &WeatherSnapshot) {
    out.push_str("Next 24 hours\n");
    for hour in weather.hourly.upcoming(HOURLY_WINDOW) {
        let d = hour.descriptor();
        let _ = writeln!(
            out,
            "  {}  {} {:>5}  rain {:>4}  {:>7}  wind {:>4} km/h",
            hour.time.format("%H:%M"),
            d.icon,
            format_opt(hour.temperature, "°C"),
            format_opt(hour.precipitation_probability, "%"),
            format_opt_mm(hour.precipitation),
            format_opt(hour.wind_speed, ""),
        );
    }
    out.push('\n');
}

fn daily(out: &mut String, weather: &WeatherSnapshot) {
    out.push_str("Daily forecast\n");
    for day in weather.daily.iter() {
        let d = day.descriptor();
        let _ = writeln!(
            out,
            "  {}  {} {:<30} {:>5} / {:<5} rain {:>4} {:>8}",
            day.date.format("%a %d %b"),
            d.icon,
            d.label,
            format_opt(day.temperature_max, "°"),
            format_opt(day.temperature_min, "°"),
            format_opt(day.precipitation_probability_max, "%"),
            format_opt_mm(day.precipitation_sum),
        );
    }
}

pub fn saved(saved: &SavedLocationSet) -> String {
    if saved.is_empty() {
        return "No saved locations.\n".to_string();
    }

    let mut out = String::new();
    for (i, location) in saved.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} ({:.4}, {:.4})",
            i + 1,
            location.display_name(),
            location.latitude,
            location.longitude
        );
    }
    out
}

// as i64 so -0.4 doesn't show up as -0
fn format_round(value: f64) -> i64 {
    value.round() as i64
}

fn format_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{unit}", format_round(v)),
        None => "-".to_string(),
    }
}

fn format_opt_mm(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1} mm"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paris() -> Location {
        Location {
            name: "Paris".into(),
            latitude: 48.8566,
            longitude: 2.3522,
            country: "France".into(),
            timezone: "Europe/Paris".into(),
        }
    }

    /// 30 hours from midnight on 2024-06-01 and a week of days, with a few
    /// gaps the provider leaves as `null`.
    fn snapshot() -> WeatherSnapshot {
        const HOURS: usize = 30;
        let times: Vec<String> =
            (0..HOURS).map(|h| format!("2024-06-{:02}T{:02}:00", 1 + h / 24, h % 24)).collect();
        let mut temperature = vec![json!(18.4); HOURS];
        temperature[5] = json!(null);
        let mut chance = vec![json!(10); HOURS];
        chance[0] = json!(null);
        let mut codes = vec![json!(0); HOURS];
        codes[2] = json!(3);
        let days: Vec<String> = (1..=7).map(|d| format!("2024-06-{d:02}")).collect();
        let mut precipitation_sum = vec![json!(2.4); 7];
        precipitation_sum[1] = json!(null);

        serde_json::from_value(json!({
            "latitude": 48.86,
            "longitude": 2.34,
            "timezone": "Europe/Paris",
            "timezone_abbreviation": "CEST",
            "current_weather": {
                "temperature": 22.3,
                "windspeed": 7.9,
                "winddirection": 243,
                "weathercode": 0,
                "time": "2024-06-01T15:00"
            },
            "hourly": {
                "time": times,
                "temperature_2m": temperature,
                "relativehumidity_2m": vec![60; HOURS],
                "precipitation_probability": chance,
                "precipitation": vec![0.0; HOURS],
                "weathercode": codes,
                "windspeed_10m": vec![8.1; HOURS],
                "winddirection_10m": vec![240; HOURS]
            },
            "daily": {
                "time": days,
                "weathercode": vec![3; 7],
                "temperature_2m_max": vec![24.4; 7],
                "temperature_2m_min": vec![13.0; 7],
                "precipitation_sum": precipitation_sum,
                "precipitation_probability_max": vec![40; 7]
            }
        }))
        .unwrap()
    }

    /// Lines under `header` up to the next blank line.
    fn section<'a>(out: &'a str, header: &str) -> Vec<&'a str> {
        out.split(&format!("{header}\n"))
            .nth(1)
            .unwrap_or_else(|| panic!("missing section {header:?} in:\n{out}"))
            .lines()
            .take_while(|line| !line.is_empty())
            .collect()
    }

    fn settled() -> OrchestratorState {
        OrchestratorState {
            location: Some(paris()),
            weather: Some(snapshot()),
            ..Default::default()
        }
    }

    #[test]
    fn current_conditions_header() {
        let out = dashboard(&settled());

        let expected = "Paris, France\n\
                        Saturday, June 1, 2024 15:00\n\
                        ☀️ 22°C  Clear sky\n\
                        Wind 8 km/h from SW (243°)\n\
                        Humidity 60%\n\
                        Precipitation 0.0 mm (- chance)\n\
                        Today 24° / 13°\n\n";
        assert!(out.starts_with(expected), "{out}");
    }

    #[test]
    fn hourly_strip_stops_at_a_day() {
        let out = dashboard(&settled());
        let rows = section(&out, "Next 24 hours");

        assert_eq!(rows.len(), HOURLY_WINDOW);
        assert!(rows[0].starts_with("  00:00  ☀️"), "{}", rows[0]);
        assert!(rows[0].contains("rain    -"), "{}", rows[0]);
        assert!(rows[2].contains("☁️"), "{}", rows[2]);
        assert!(rows[5].contains("    -  rain  10%"), "{}", rows[5]);
        assert!(rows[23].starts_with("  23:00"), "{}", rows[23]);
    }

    #[test]
    fn daily_rows_show_totals() {
        let out = dashboard(&settled());
        let rows = section(&out, "Daily forecast");

        assert_eq!(rows.len(), 7);
        assert!(rows[0].starts_with("  Sat 01 Jun  ☁️ Overcast"), "{}", rows[0]);
        assert!(rows[0].contains("24° / 13°"), "{}", rows[0]);
        assert!(rows[0].contains("rain  40%"), "{}", rows[0]);
        assert!(rows[0].ends_with("  2.4 mm"), "{}", rows[0]);
        assert!(rows[1].ends_with(" -"), "{}", rows[1]);
    }

    #[test]
    fn error_without_weather_prints_nothing() {
        let state = OrchestratorState {
            location: Some(paris()),
            error: Some("Error loading weather data: timed out".into()),
            ..Default::default()
        };
        assert_eq!(dashboard(&state), "");
    }

    #[test]
    fn idle_state_prompts_for_search() {
        let out = dashboard(&OrchestratorState::default());
        assert!(out.contains("Search for a location"));
    }

    #[test]
    fn loading_hides_everything_else() {
        let state = OrchestratorState {
            loading: true,
            error: Some("stale".into()),
            ..Default::default()
        };
        assert_eq!(dashboard(&state), "Loading weather data...\n");
    }

    #[test]
    fn saved_list_is_numbered_from_one() {
        let mut set = SavedLocationSet::new();
        set.add(Location {
            name: "Oslo".into(),
            latitude: 59.9139,
            longitude: 10.7522,
            country: "Norway".into(),
            timezone: "Europe/Oslo".into(),
        });

        assert_eq!(saved(&set), "  1. Oslo, Norway (59.9139, 10.7522)\n");
        assert_eq!(saved(&SavedLocationSet::new()), "No saved locations.\n");
    }

    #[test]
    fn rounding_never_prints_negative_zero() {
        assert_eq!(format_opt(Some(-0.4), "°"), "0°");
        assert_eq!(format_opt(Some(-1.6), "°"), "-2°");
        assert_eq!(format_opt(None, "°"), "-");
    }
}
