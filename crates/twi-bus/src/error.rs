/// Errors reported by bus transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// Another agent was driving the bus when a start or stop condition
    /// was attempted.
    BusUnavailable,
    /// The addressed device did not acknowledge its address byte. This is
    /// the expected outcome for unpopulated addresses during a bus scan.
    NoAcknowledge,
    /// A device held the clock line low beyond the retry ceiling.
    ClockStretchTimeout,
    /// A data byte was not acknowledged after `done` bytes had been
    /// accepted; the transfer moved fewer bytes than requested.
    ShortTransfer {
        /// Bytes acknowledged before the abort.
        done: usize,
    },
}

impl core::fmt::Display for TwiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TwiError::BusUnavailable => {
                write!(f, "bus held by another agent")
            }
            TwiError::NoAcknowledge => {
                write!(f, "device did not acknowledge")
            }
            TwiError::ClockStretchTimeout => {
                write!(f, "clock stretched beyond retry ceiling")
            }
            TwiError::ShortTransfer { done } => {
                write!(f, "transfer aborted after {} bytes", done)
            }
        }
    }
}
