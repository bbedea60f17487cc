use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

use super::*;

pub type TicketId = String;

/// Descriptions longer than this are truncated when used as a title.
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TicketState {
    Open,
    Claimed,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    /// Maps a classifier severity estimate (0-10 scale) to a priority tier.
    pub fn from_severity(severity: f64) -> Self {
        if severity >= 7.0 {
            Self::High
        } else if severity >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

/// A named group of volunteers claiming a ticket jointly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Squad {
    pub name: String,
    pub members: Vec<UserId>,
}

/// Who holds a claim: a single volunteer or a squad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Claimant {
    Individual(UserId),
    Squad(Squad),
}

impl Claimant {
    pub fn individual(id: impl Into<UserId>) -> Self {
        Self::Individual(id.into())
    }

    pub fn squad(name: impl Into<String>, members: Vec<UserId>) -> Self {
        Self::Squad(Squad {
            name: name.into(),
            members,
        })
    }

    /// Everyone who shares in a reward earned under this claim.
    pub fn members(&self) -> Vec<UserId> {
        match self {
            Self::Individual(id) => vec![id.clone()],
            Self::Squad(squad) => squad.members.clone(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Individual(id) => id,
            Self::Squad(squad) => &squad.name,
        }
    }
}

/// A litter report moving through OPEN, CLAIMED and COMPLETED.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
    pub state: TicketState,
    pub camera_id: String,
    pub camera_name: String,
    /// Classifier severity estimate on the 0-10 scale.
    pub severity: f64,
    pub num_detections: u32,
    pub before_image_url: String,
    pub after_image_url: Option<String>,
    pub claimed_by: Option<Claimant>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// A completion attempt on this ticket was judged unsuccessful and the
    /// half-points award was already paid out.
    pub had_failed_attempt: bool,
}

impl Ticket {
    pub fn new(
        id: impl Into<TicketId>,
        description: impl Into<String>,
        severity: f64,
        lat: f64,
        lng: f64,
        before_image_url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let description = description.into();
        Self {
            id: id.into(),
            title: title_from_description(&description),
            description,
            priority: TicketPriority::from_severity(severity),
            lat,
            lng,
            created_at,
            state: TicketState::Open,
            camera_id: "user-report".to_string(),
            camera_name: format!("{lat:.4}, {lng:.4}"),
            severity,
            num_detections: (severity * 3.0).floor() as u32,
            before_image_url: before_image_url.into(),
            after_image_url: None,
            claimed_by: None,
            claimed_at: None,
            completed_at: None,
            had_failed_attempt: false,
        }
    }

    /// Severity as the 0-100 percentage shown on ticket cards.
    pub fn severity_score(&self) -> u32 {
        (self.severity * 10.0).round() as u32
    }

    pub fn is_claimed_by(&self, claimant: &Claimant) -> bool {
        self.claimed_by.as_ref() == Some(claimant)
    }
}

/// Derives a readable title from a report description.
pub fn title_from_description(description: &str) -> String {
    if description.is_empty() {
        return "Litter Report".to_string();
    }
    if description.chars().count() > TITLE_MAX_CHARS {
        let head: String = description.chars().take(TITLE_MAX_CHARS - 3).collect();
        format!("{head}...")
    } else {
        description.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_boundaries() {
        assert_eq!(TicketPriority::from_severity(7.0), TicketPriority::High);
        assert_eq!(TicketPriority::from_severity(6.99), TicketPriority::Medium);
        assert_eq!(TicketPriority::from_severity(4.0), TicketPriority::Medium);
        assert_eq!(TicketPriority::from_severity(3.99), TicketPriority::Low);
        assert_eq!(TicketPriority::from_severity(0.0), TicketPriority::Low);
    }

    #[test]
    fn title_derivation() {
        assert_eq!(title_from_description(""), "Litter Report");
        assert_eq!(title_from_description("Bottles by the gate"), "Bottles by the gate");

        let long = "Multiple plastic bottles and paper waste detected near the station";
        let title = title_from_description(long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn severity_score_is_percentage() {
        let ticket = Ticket::new("t-1", "test", 8.5, 0.0, 0.0, "/img.jpg", Utc::now());
        assert_eq!(ticket.severity_score(), 85);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.state, TicketState::Open);
    }

    #[test]
    fn state_strings_match_wire_format() {
        assert_eq!(TicketState::Open.to_string(), "OPEN");
        assert_eq!(TicketPriority::High.to_string(), "HIGH");
        assert_eq!("MEDIUM".parse::<TicketPriority>().unwrap(), TicketPriority::Medium);
    }
}
