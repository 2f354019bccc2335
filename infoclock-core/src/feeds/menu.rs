//! Restaurant menu of the day
//!
//! The menu API returns a JSON array of dishes for one salepoint and date.
//! Only lunch (`"midi"`) dishes are kept, shortened to a few key words and
//! joined into a single scrolling line.

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;
use serde_json::Value;
use time::{Date, PrimitiveDateTime};

use super::http::{FetchError, Request};
use super::text::{fold_french, key_words};
use super::FeedError;
use crate::config::{
    Config, DEFAULT_MENU_END_HOUR, DEFAULT_MENU_START_HOUR, DEFAULT_RESTAURANT, MENU_END_HOUR,
    MENU_SHOW_TOMORROW, MENU_START_HOUR, NOVAE_KEY, RESTAURANT,
};

/// Seconds between schedule checks
pub const CHECK_SECS: u64 = 900;

/// Most dishes kept per menu
pub const MAX_DISHES: usize = 10;

/// Words kept per dish
pub const DISH_WORDS: usize = 4;

/// Fetch attempts before giving up on a transport failure
pub const FETCH_ATTEMPTS: u8 = 3;

/// Seconds between fetch attempts
pub const RETRY_SECS: u64 = 2;

/// A known restaurant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restaurant {
    pub code: u8,
    pub id: &'static str,
}

pub const RESTAURANTS: [Restaurant; 3] = [
    Restaurant {
        code: 1,
        id: "13-restaurant-r1",
    },
    Restaurant {
        code: 2,
        id: "21-restaurant-r2",
    },
    Restaurant {
        code: 3,
        id: "33-restaurant-r3",
    },
];

impl Restaurant {
    /// Restaurant for a configured code; unknown codes fall back to R1
    pub fn from_code(code: i32) -> Self {
        RESTAURANTS
            .iter()
            .copied()
            .find(|r| i32::from(r.code) == code)
            .unwrap_or(RESTAURANTS[0])
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_code(config.i32_or(RESTAURANT, DEFAULT_RESTAURANT))
    }

    /// Menu request for `date`
    pub fn request(&self, date: Date, novae_key: &str) -> Result<Request, FetchError> {
        Request::get(format!(
            "https://api.mynovae.ch/en/api/v2/salepoints/{}/menus/{}",
            self.id,
            date_string(date)
        ))
        .header("Novae-Codes", novae_key)?
        .header("Accept", "application/json")?
        .header("X-Requested-With", "xmlhttprequest")
    }
}

/// `YYYY-MM-DD`
pub fn date_string(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Which day's menu is on display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuDay {
    Today,
    Tomorrow,
}

/// Hours of the day during which the menu is shown
///
/// `start == end` never matches; `start > end` wraps around midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuWindow {
    pub start_hour: u8,
    pub end_hour: u8,
    /// After the window closes, show the next day's menu
    pub show_tomorrow: bool,
}

impl Default for MenuWindow {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_MENU_START_HOUR,
            end_hour: DEFAULT_MENU_END_HOUR,
            show_tomorrow: false,
        }
    }
}

impl MenuWindow {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_hour: config.hour_or(MENU_START_HOUR, DEFAULT_MENU_START_HOUR),
            end_hour: config.hour_or(MENU_END_HOUR, DEFAULT_MENU_END_HOUR),
            show_tomorrow: config.flag_or(MENU_SHOW_TOMORROW, false),
        }
    }

    /// Check whether `hour` falls inside the window
    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Check whether the window has closed for the day at `hour`
    pub fn is_after_end(&self, hour: u8) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.end_hour
        } else {
            hour >= self.end_hour && hour < self.start_hour
        }
    }

    /// Day whose menu should be shown at `now`, if any
    pub fn display_day(&self, now: PrimitiveDateTime) -> Option<MenuDay> {
        let hour = now.hour();
        if self.contains(hour) {
            Some(MenuDay::Today)
        } else if self.show_tomorrow && self.is_after_end(hour) {
            Some(MenuDay::Tomorrow)
        } else {
            None
        }
    }

    /// Date of the menu that should be cached at `now`
    pub fn active_date(&self, now: PrimitiveDateTime) -> Date {
        let today = now.date();
        if self.show_tomorrow && self.is_after_end(now.hour()) {
            today.next_day().unwrap_or(today)
        } else {
            today
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Dish {
    #[serde(default)]
    title: Title,
    #[serde(default)]
    model: Model,
}

#[derive(Debug, Default, Deserialize)]
struct Title {
    en: Option<String>,
    fr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Model {
    service: Option<String>,
}

impl Dish {
    fn is_lunch(&self) -> bool {
        self.model
            .service
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("midi"))
    }

    fn name(&self) -> Option<&str> {
        [self.title.en.as_deref(), self.title.fr.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
    }
}

/// Shortened names of the lunch dishes in a menu body
///
/// Entries that do not look like dishes are skipped. Names are folded to
/// ASCII, trimmed to key words and de-duplicated, keeping at most
/// [`MAX_DISHES`].
pub fn parse_dishes(body: &str) -> Result<Vec<String>, FeedError> {
    let entries: Vec<Value> = serde_json::from_str(body)?;
    let mut seen = BTreeSet::new();
    let mut dishes = Vec::new();

    for entry in entries {
        let Ok(dish) = Dish::deserialize(entry) else {
            continue;
        };
        if !dish.is_lunch() {
            continue;
        }
        let Some(name) = dish.name() else {
            continue;
        };
        let short = key_words(&fold_french(name), DISH_WORDS);
        if short.is_empty() || !seen.insert(short.clone()) {
            continue;
        }
        dishes.push(short);
        if dishes.len() >= MAX_DISHES {
            break;
        }
    }
    Ok(dishes)
}

/// Last fetched menu line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuCache {
    line: String,
    date: Option<Date>,
}

impl MenuCache {
    /// Store the dishes fetched for `date`
    ///
    /// An empty list clears the line, so nothing is shown until the next
    /// successful fetch.
    pub fn store(&mut self, date: Date, dishes: &[String]) -> Result<(), FeedError> {
        if dishes.is_empty() {
            self.line.clear();
            return Err(FeedError::Empty);
        }
        self.line = dishes.join(" | ");
        self.date = Some(date);
        Ok(())
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn date(&self) -> Option<Date> {
        self.date
    }

    /// Message to scroll at `now`, if the cached menu is the one due
    pub fn message(
        &self,
        window: &MenuWindow,
        restaurant: Restaurant,
        now: PrimitiveDateTime,
    ) -> Option<String> {
        let day = window.display_day(now)?;
        let wanted = match day {
            MenuDay::Today => now.date(),
            MenuDay::Tomorrow => now.date().next_day()?,
        };
        if self.date != Some(wanted) || self.line.is_empty() {
            return None;
        }
        let label = match day {
            MenuDay::Today => "Today's",
            MenuDay::Tomorrow => "Tomorrow's",
        };
        Some(format!("{} R{} menu: {}", label, restaurant.code, self.line))
    }
}

/// Decides when the menu must be fetched again
///
/// A fetch is due whenever the hour or the active menu date changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSchedule {
    last_hour: Option<u8>,
    last_date: Option<Date>,
}

impl FetchSchedule {
    /// Check and record whether a fetch is due for `date` at `hour`
    pub fn due(&mut self, hour: u8, date: Date) -> bool {
        if self.last_hour == Some(hour) && self.last_date == Some(date) {
            return false;
        }
        self.last_hour = Some(hour);
        self.last_date = Some(date);
        true
    }
}

/// Access code for the menu API
pub fn novae_key(config: &Config) -> &str {
    config.get_or(NOVAE_KEY, "")
}
