//! WMO weather interpretation codes as reported by Open-Meteo.
//! See: https://open-meteo.com/en/docs#weathervariables

/// Icon shown for codes outside the known table.
pub const FALLBACK_ICON: &str = "❓";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub label: &'static str,
    pub icon: &'static str,
}

/// Map a weather code to its label and icon. Unknown codes, including
/// negative ones, map to `"Unknown"` with [`FALLBACK_ICON`].
pub fn describe(code: i32) -> Descriptor {
    let (label, icon) = match code {
        0 => ("Clear sky", "☀️"),
        1 => ("Mainly clear", "🌤️"),
        2 => ("Partly cloudy", "⛅"),
        3 => ("Overcast", "☁️"),
        45 => ("Fog", "🌫️"),
        48 => ("Depositing rime fog", "🌫️"),
        51 => ("Light drizzle", "🌦️"),
        53 => ("Moderate drizzle", "🌦️"),
        55 => ("Dense drizzle", "🌧️"),
        56 => ("Light freezing drizzle", "🌨️"),
        57 => ("Dense freezing drizzle", "🌨️"),
        61 => ("Slight rain", "🌦️"),
        63 => ("Moderate rain", "🌧️"),
        65 => ("Heavy rain", "🌧️"),
        66 => ("Light freezing rain", "🌨️"),
        67 => ("Heavy freezing rain", "🌨️"),
        71 => ("Slight snow fall", "🌨️"),
        73 => ("Moderate snow fall", "🌨️"),
        75 => ("Heavy snow fall", "❄️"),
        77 => ("Snow grains", "❄️"),
        80 => ("Slight rain showers", "🌦️"),
        81 => ("Moderate rain showers", "🌧️"),
        82 => ("Violent rain showers", "⛈️"),
        85 => ("Slight snow showers", "🌨️"),
        86 => ("Heavy snow showers", "❄️"),
        95 => ("Thunderstorm", "⛈️"),
        96 => ("Thunderstorm with slight hail", "⛈️"),
        99 => ("Thunderstorm with heavy hail", "⛈️"),
        _ => ("Unknown", FALLBACK_ICON),
    };
    Descriptor { label, icon }
}
