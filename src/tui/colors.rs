//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Cycle highlighting for nodes, edges and arrowheads
pub const CYCLE_RED: Color = Color::Rgb(239, 68, 68);
/// Edges and arrowheads outside any cycle
pub const EDGE_GRAY: Color = Color::Rgb(209, 213, 219);
/// Node outline outside any cycle
pub const NODE_INDIGO: Color = Color::Rgb(99, 102, 241);

/// Priority tiers
pub const TIER_HIGH: Color = Color::Rgb(220, 38, 38);
pub const TIER_MEDIUM: Color = Color::Rgb(255, 215, 0);
pub const TIER_LOW: Color = Color::Rgb(0, 128, 0);
