use serde::{Deserialize, Serialize};

mod badge;
mod error;
mod filter;
mod points;
mod ticket;

#[cfg(feature = "client")]
pub mod backend;

pub use badge::*;
pub use error::*;
pub use filter::*;
pub use points::*;
pub use ticket::*;

pub type UserId = String;

/// A volunteer account with its accumulated reward points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub points: u32,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email,
            points: 0,
        }
    }

    /// Placeholder account created the first time a reward is credited,
    /// before the backend snapshot catches up.
    pub fn with_id(id: impl Into<UserId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            email: None,
            points: 0,
        }
    }

    pub fn add_points(&mut self, amount: u32) {
        self.points += amount;
    }

    pub fn badge(&self) -> &'static str {
        badge_for_points(self.points)
    }
}

/// Read-only leaderboard projection of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub id: UserId,
    pub name: String,
    pub points: u32,
    pub badges: Vec<String>,
    pub rank: u32,
}

/// Sorts users by points descending and assigns 1-based ranks.
/// Users with equal points keep their input relative order.
pub fn rank_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<LeaderboardEntry> {
    let mut users: Vec<&User> = users.into_iter().collect();
    users.sort_by(|a, b| b.points.cmp(&a.points));
    users
        .into_iter()
        .enumerate()
        .map(|(index, user)| LeaderboardEntry {
            id: user.id.clone(),
            name: user.name.clone(),
            points: user.points,
            badges: vec![user.badge().to_string()],
            rank: index as u32 + 1,
        })
        .collect()
}
