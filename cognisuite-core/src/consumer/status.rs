use std::fmt;

/// Lifecycle of one view model.
///
/// `Idle → Submitting → Streaming → Done | Error`; a new submission is
/// accepted from `Idle`, `Done` and `Error`. Cancel returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Submitting,
    Streaming,
    Done,
    Error,
}

impl Status {
    /// A request is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitting | Self::Streaming)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
