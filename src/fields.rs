//! Enumerations and small value types shared across the client.
//!
//! This module defines the scoring strategies the user can pick, the four
//! Eisenhower quadrants, the score-derived priority tiers and the visual style
//! attached to graph nodes and edges.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Weighting scheme the analysis service applies when scoring.
///
/// The client only selects and labels a strategy; the weights themselves are
/// computed remotely.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// 40% urgency, 40% importance, 20% effort efficiency.
    #[default]
    Smart,
    /// Lowest effort first.
    Effort,
    /// Importance only.
    Importance,
    /// Urgency and deadline only.
    Urgency,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Smart,
        Strategy::Effort,
        Strategy::Importance,
        Strategy::Urgency,
    ];

    /// Wire value sent to the analysis service.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Smart => "smart",
            Strategy::Effort => "effort",
            Strategy::Importance => "importance",
            Strategy::Urgency => "urgency",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Smart => "Smart Balance",
            Strategy::Effort => "Fastest Wins",
            Strategy::Importance => "High Impact",
            Strategy::Urgency => "Deadline Driven",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Strategy::Smart => {
                "Combines urgency (40%), importance (40%), and effort efficiency (20%)"
            }
            Strategy::Effort => "Prioritizes tasks with lowest effort to build momentum",
            Strategy::Importance => "Focuses on task importance regardless of effort or urgency",
            Strategy::Urgency => "Prioritizes tasks by urgency and approaching deadlines",
        }
    }

    /// The strategy after this one, wrapping around.
    pub fn next(self) -> Strategy {
        match self {
            Strategy::Smart => Strategy::Effort,
            Strategy::Effort => Strategy::Importance,
            Strategy::Importance => Strategy::Urgency,
            Strategy::Urgency => Strategy::Smart,
        }
    }
}

/// Eisenhower urgency/importance bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    DoFirst,
    Schedule,
    Delegate,
    Eliminate,
}

impl Quadrant {
    /// Display order: top-left, top-right, bottom-left, bottom-right.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::DoFirst,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Eliminate,
    ];

    pub fn index(self) -> usize {
        match self {
            Quadrant::DoFirst => 0,
            Quadrant::Schedule => 1,
            Quadrant::Delegate => 2,
            Quadrant::Eliminate => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Quadrant::DoFirst => "Do First (Urgent & Important)",
            Quadrant::Schedule => "Schedule (Important, Not Urgent)",
            Quadrant::Delegate => "Delegate (Urgent, Not Important)",
            Quadrant::Eliminate => "Eliminate (Neither)",
        }
    }
}

/// Coarse priority band derived from the overall score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            PriorityTier::High
        } else if score >= 0.4 {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityTier::High => "high",
            PriorityTier::Medium => "medium",
            PriorityTier::Low => "low",
        }
    }
}

/// Visual class of a graph node or edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    Normal,
    Cycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_wire_values_match_serde() {
        for strategy in Strategy::ALL {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy.as_str()));
        }
    }

    #[test]
    fn strategy_next_cycles_through_all() {
        let mut s = Strategy::Smart;
        for expected in [Strategy::Effort, Strategy::Importance, Strategy::Urgency, Strategy::Smart] {
            s = s.next();
            assert_eq!(s, expected);
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(PriorityTier::from_score(0.7), PriorityTier::High);
        assert_eq!(PriorityTier::from_score(0.69), PriorityTier::Medium);
        assert_eq!(PriorityTier::from_score(0.4), PriorityTier::Medium);
        assert_eq!(PriorityTier::from_score(0.39), PriorityTier::Low);
        assert_eq!(PriorityTier::from_score(0.0), PriorityTier::Low);
    }
}
