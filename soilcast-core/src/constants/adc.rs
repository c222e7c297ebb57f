//! Analog Front-End and Calibration Constants
//!
//! This module defines the ADC channel, resolution and calibration points for
//! the resistive/capacitive soil moisture probe wired to the node.

// ===== ADC CHANNEL =====

/// GPIO number of the moisture probe input.
///
/// GPIO36 is ADC1 channel 0 on the ESP32. ADC1 is used because ADC2 is
/// unavailable while the WiFi radio is active.
///
/// Source: ESP32 technical reference manual, ADC chapter
pub const MOISTURE_ADC_CHANNEL: u8 = 36;

/// ADC resolution in bits.
///
/// The ESP32 SAR ADC delivers 12-bit conversions by default.
pub const ADC_RESOLUTION_BITS: u8 = 12;

/// Highest count the ADC can report at the given resolution.
pub const fn max_adc_value(resolution_bits: u8) -> u16 {
    if resolution_bits >= 16 {
        u16::MAX
    } else {
        (1u16 << resolution_bits) - 1
    }
}

/// Full-scale count for the default resolution (4095).
pub const ADC_MAX_VALUE: u16 = max_adc_value(ADC_RESOLUTION_BITS);

// ===== CALIBRATION =====

/// Raw count reported with the probe in dry air (maps to 0%).
///
/// Resistive probes read high when dry: the divider sits near full scale.
pub const CALIBRATION_DRY_RAW: u16 = 4095;

/// Raw count reported with the probe submerged in water (maps to 100%).
pub const CALIBRATION_WET_RAW: u16 = 0;

/// Upper bound of the percentage scale.
pub const PERCENT_MAX: u16 = 100;
