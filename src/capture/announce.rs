//! Global announcements produced by the capture system

use serde::{Deserialize, Serialize};

use crate::core::types::Color;

/// Chat channel an announcement is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnouncementCategory {
    Objective,
    Round,
}

impl AnnouncementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementCategory::Objective => "Objective",
            AnnouncementCategory::Round => "Round",
        }
    }
}

/// A single global announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub message: String,
    pub category: AnnouncementCategory,
    pub color: Color,
}

impl Announcement {
    pub fn new(message: String, category: AnnouncementCategory, color: Color) -> Self {
        Self { message, category, color }
    }

    pub fn gained_control(faction: &str, region: &str) -> Self {
        Self::new(
            format!("{} has gained control of {}!", faction, region),
            AnnouncementCategory::Objective,
            Color::DodgerBlue,
        )
    }

    pub fn lost_control(faction: &str, region: &str) -> Self {
        Self::new(
            format!("{} has lost control of {}!", faction, region),
            AnnouncementCategory::Objective,
            Color::Red,
        )
    }

    pub fn two_minute_warning(faction: &str, region: &str) -> Self {
        Self::new(
            format!("Two minutes until {} captures {}!", faction, region),
            AnnouncementCategory::Round,
            Color::Blue,
        )
    }

    pub fn one_minute_warning(faction: &str, region: &str) -> Self {
        Self::new(
            format!("One minute until {} captures {}!", faction, region),
            AnnouncementCategory::Round,
            Color::Blue,
        )
    }

    pub fn capture_victory(faction: &str, region: &str) -> Self {
        Self::new(
            format!("{} has captured {} and is victorious!", faction, region),
            AnnouncementCategory::Round,
            Color::Green,
        )
    }

    /// Timeouts under a minute are reported in seconds
    pub fn defender_victory(faction: &str, timeout_secs: f32) -> Self {
        let held = if timeout_secs < 60.0 {
            count_of(timeout_secs.round(), "second")
        } else {
            count_of((timeout_secs / 60.0).round(), "minute")
        };
        Self::new(
            format!("{} has successfully defended for {} and wins the round!", faction, held),
            AnnouncementCategory::Round,
            Color::Green,
        )
    }
}

fn count_of(amount: f32, unit: &str) -> String {
    if amount == 1.0 {
        format!("1 {}", unit)
    } else {
        format!("{:.0} {}s", amount, unit)
    }
}

/// Global broadcast channel
///
/// Fire-and-forget. Delivery failures are the channel's concern.
pub trait Broadcast {
    fn announce(&mut self, message: &str, category: &str, color: Color);
}

/// Collects announcements in memory
impl Broadcast for Vec<Announcement> {
    fn announce(&mut self, message: &str, category: &str, color: Color) {
        let category = match category {
            "Round" => AnnouncementCategory::Round,
            _ => AnnouncementCategory::Objective,
        };
        self.push(Announcement::new(message.to_string(), category, color));
    }
}
