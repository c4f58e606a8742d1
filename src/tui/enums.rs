//! Enumerations for TUI state management.

/// Result pane currently on screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tab {
    Ranked,
    Graph,
    Matrix,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Ranked, Tab::Graph, Tab::Matrix];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Ranked => "Ranked",
            Tab::Graph => "Dependency Graph",
            Tab::Matrix => "Eisenhower Matrix",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Ranked => 0,
            Tab::Graph => 1,
            Tab::Matrix => 2,
        }
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Severity of a transient status message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    Info,
    Error,
}
