use serde::{Deserialize, Serialize};

/// Display category derived from a WMO weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherIcon {
    Clear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    FreezingRain,
    Snow,
    Thunderstorm,
}

impl WeatherIcon {
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => WeatherIcon::Clear,
            1 | 2 => WeatherIcon::PartlyCloudy,
            3 => WeatherIcon::Cloudy,
            45 | 48 => WeatherIcon::Fog,
            51 | 53 | 55 | 56 | 57 => WeatherIcon::Drizzle,
            61 | 63 | 80 | 81 => WeatherIcon::Rain,
            65 | 82 => WeatherIcon::HeavyRain,
            66 | 67 => WeatherIcon::FreezingRain,
            71 | 73 | 75 | 77 | 85 | 86 => WeatherIcon::Snow,
            95 | 96 | 99 => WeatherIcon::Thunderstorm,
            _ => WeatherIcon::PartlyCloudy,
        }
    }
}

/// Forecast attached to one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWeather {
    pub temperature: i32,
    pub rain_chance: i32,
    pub weather_code: i32,
    pub icon: WeatherIcon,
}

impl SessionWeather {
    pub fn new(temperature: f64, rain_chance: i32, weather_code: i32) -> Self {
        Self {
            temperature: temperature.trunc() as i32,
            rain_chance,
            weather_code,
            icon: WeatherIcon::from_wmo_code(weather_code),
        }
    }
}

/// Hourly forecast series; `times` are UTC `YYYY-MM-DDTHH:MM` strings and
/// the other columns are index-aligned with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub times: Vec<String>,
    pub temperatures: Vec<Option<f64>>,
    pub precipitation_probabilities: Vec<Option<i32>>,
    pub weather_codes: Vec<Option<i32>>,
}
