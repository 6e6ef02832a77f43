/// Line-level timing parameters.
///
/// The defaults reproduce standard-mode timing for a software master:
/// 5 µs start-condition setup, 4 µs quarter-wave clock delay, and a
/// 20-poll ceiling for a device stretching the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Start and repeated-start condition setup time in microseconds.
    pub t_start_us: u32,
    /// Basic clock delay in microseconds, applied between line
    /// transitions within a bit.
    pub t_clock_us: u32,
    /// Maximum number of clock-level polls while a device stretches the
    /// clock, with one clock delay between polls.
    pub stretch_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { t_start_us: 5, t_clock_us: 4, stretch_retries: 20 }
    }
}
