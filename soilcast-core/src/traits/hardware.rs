//! Analog input abstraction

/// One analog channel of the ADC
///
/// Reads are best-effort: a driver that hits a conversion fault returns its
/// best guess (typically the previous value) rather than an error.
pub trait AnalogInput {
    /// Raw conversion result in ADC counts
    fn read_raw(&mut self) -> u16;
}

impl<F: FnMut() -> u16> AnalogInput for F {
    fn read_raw(&mut self) -> u16 {
        self()
    }
}
