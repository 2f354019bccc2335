//! LHC machine status
//!
//! The status page is an RSS document whose item titles look like
//! `<title>LhcBeamMode: STABLE BEAMS</title>`. Only a handful of fields
//! are kept; the rest of the feed is ignored.

use alloc::format;
use alloc::string::String;

/// RSS feed with the current machine status
pub const STATUS_URL: &str = "https://alicedcs.web.cern.ch/monitoring/screenshots/rss.xml";

/// Seconds between successful refreshes
pub const REFRESH_SECS: u64 = 30;

/// Seconds to wait after a failed fetch
pub const RETRY_SECS: u64 = 60;

/// Latest known status fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LhcStatus {
    /// Operator comment shown on page 1
    pub page1: String,
    pub beam_mode: String,
    pub beam_energy: String,
    pub machine_mode: String,
}

impl LhcStatus {
    /// Status built from a single feed body
    pub fn parse(body: &str) -> Self {
        let mut status = Self::default();
        status.update(body);
        status
    }

    /// Apply every known field found in `body`
    ///
    /// Fields missing from the body keep their previous value. Returns
    /// whether anything was found.
    pub fn update(&mut self, body: &str) -> bool {
        let mut updated = false;
        for line in body.lines() {
            let line = line.trim();
            if !line.starts_with("<title>") {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim_start_matches("<title>");
            let Some(slot) = self.field_mut(name) else {
                continue;
            };
            *slot = clean_value(value);
            updated = true;
        }
        updated
    }

    /// `"{machine}: {beam} @ {energy}"`
    pub fn mode_message(&self) -> String {
        format!(
            "{}: {} @ {}",
            self.machine_mode, self.beam_mode, self.beam_energy
        )
    }

    /// Page 1 comment, if there is one
    pub fn page1_message(&self) -> Option<&str> {
        if self.page1.is_empty() {
            None
        } else {
            Some(&self.page1)
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "LhcPage1" => Some(&mut self.page1),
            "LhcBeamMode" => Some(&mut self.beam_mode),
            "BeamEnergy" => Some(&mut self.beam_energy),
            "LhcMachineMode" => Some(&mut self.machine_mode),
            _ => None,
        }
    }
}

fn clean_value(raw: &str) -> String {
    raw.replace("<br>", "--")
        .replace("<br/>", "--")
        .replace("</title>", "")
        .trim()
        .into()
}
