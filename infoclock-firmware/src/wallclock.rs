//! Wall-clock time
//!
//! The board has no battery-backed clock. The modem task records each SNTP
//! reply together with the uptime at which it arrived, and local time is
//! extrapolated from that anchor.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;
use time::{Duration, PrimitiveDateTime};

#[derive(Clone, Copy)]
struct Anchor {
    utc: PrimitiveDateTime,
    at: Instant,
}

/// Time of day, valid once SNTP has answered
pub struct WallClock {
    anchor: Mutex<CriticalSectionRawMutex, Cell<Option<Anchor>>>,
    offset_hours: Mutex<CriticalSectionRawMutex, Cell<i8>>,
}

/// The board's wall clock
pub static WALL_CLOCK: WallClock = WallClock::new();

impl WallClock {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
            offset_hours: Mutex::new(Cell::new(0)),
        }
    }

    /// Hours added to UTC for local time
    pub fn set_offset_hours(&self, hours: i8) {
        self.offset_hours.lock(|offset| offset.set(hours));
    }

    /// Record a UTC time received just now
    pub fn sync(&self, utc: PrimitiveDateTime) {
        let anchor = Anchor {
            utc,
            at: Instant::now(),
        };
        self.anchor.lock(|cell| cell.set(Some(anchor)));
    }

    pub fn is_synced(&self) -> bool {
        self.anchor.lock(Cell::get).is_some()
    }

    /// Local time, or `None` before the first sync
    pub fn now(&self) -> Option<PrimitiveDateTime> {
        let anchor = self.anchor.lock(Cell::get)?;
        let elapsed = Duration::seconds(anchor.at.elapsed().as_secs() as i64);
        let offset = Duration::hours(i64::from(self.offset_hours.lock(Cell::get)));
        anchor.utc.checked_add(elapsed + offset)
    }
}
