//! Known configuration keys and their defaults

/// OpenWeatherMap API key
pub const OW_API_KEY: &str = "ow_api_key";
/// OpenWeatherMap city id
pub const OW_CITY_ID: &str = "ow_city_id";
/// Restaurant code (1..=3)
pub const RESTAURANT: &str = "restaurant";
/// First hour of the menu display window
pub const MENU_START_HOUR: &str = "menuStartHour";
/// Hour the menu display window closes
pub const MENU_END_HOUR: &str = "menuEndHour";
/// Show tomorrow's menu once the window has closed (`1` to enable)
pub const MENU_SHOW_TOMORROW: &str = "menuShowTomorrow";
/// Access code sent to the menu API
pub const NOVAE_KEY: &str = "novae_key";
/// Number of 8x8 modules in the matrix chain
pub const DISPLAY_SEGMENTS: &str = "display_segments";
/// Offset of local time from UTC, in hours
pub const UTC_OFFSET_HOURS: &str = "utc_offset_hours";
/// Text scrolled by the marquee
pub const MARQUEE_TEXT: &str = "marquee_text";

pub const DEFAULT_RESTAURANT: i32 = 3;
pub const DEFAULT_MENU_START_HOUR: u8 = 9;
pub const DEFAULT_MENU_END_HOUR: u8 = 14;
pub const DEFAULT_DISPLAY_SEGMENTS: u8 = 8;
pub const DEFAULT_MARQUEE_TEXT: &str = "RP2040!";

/// Largest supported matrix chain
pub const MAX_DISPLAY_SEGMENTS: u8 = 16;
