/// An open-drain signal line.
///
/// The line is driven only low; the high state comes from an external
/// pull-up once the line is released to high impedance. Reading returns
/// the wired level, which another agent may be holding low regardless of
/// this side's drive state.
pub trait Line {
    /// Stop driving the line; the external pull-up takes it high.
    fn release(&mut self);

    /// Actively drive the line low.
    fn drive_low(&mut self);

    /// Sample the current logic level of the line.
    fn is_high(&mut self) -> bool;
}

impl<L: Line + ?Sized> Line for &mut L {
    fn release(&mut self) {
        (**self).release()
    }

    fn drive_low(&mut self) {
        (**self).drive_low()
    }

    fn is_high(&mut self) -> bool {
        (**self).is_high()
    }
}
