//! Payload encoding
//!
//! Readings travel as compact JSON. Where the device identity goes depends on
//! the transport:
//!
//! | Transport        | Body                                          | Identity carried by         |
//! |------------------|-----------------------------------------------|-----------------------------|
//! | Request/response | `{"device_id":"esp32_1","moisture_value":812}` | body                        |
//! | Publish session  | `{"moisture_value":812}`                       | topic `sensors/moisture/<id>` |
//!
//! Readings are serialized with `serde-json-core` straight into a fixed
//! [`Payload`] buffer, without touching the heap. A reading that does not fit
//! is an [`EncodingOverflow`](TelemetryError::EncodingOverflow), never a
//! truncated body.

use serde::Serialize;

use crate::constants::buffers::PAYLOAD_CAPACITY;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::sampler::Reading;
use crate::traits::TransportMode;

/// Encoded reading, bounded by [`PAYLOAD_CAPACITY`]
pub type Payload = heapless::Vec<u8, PAYLOAD_CAPACITY>;

/// Where the device identity is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPlacement {
    /// `device_id` field in the body (self-contained messages)
    Body,
    /// Destination name; the body only holds the value
    Destination,
}

impl From<TransportMode> for IdentityPlacement {
    fn from(mode: TransportMode) -> Self {
        match mode {
            TransportMode::RequestResponse => Self::Body,
            TransportMode::PublishSession => Self::Destination,
        }
    }
}

/// Wire shape of a reading; field order is the serialization order
#[derive(Serialize)]
struct WireReading<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<&'a str>,
    moisture_value: u16,
}

impl WireReading<'_> {
    /// Length of the serialized form, escapes included
    fn encoded_len(&self) -> usize {
        let digits = self.moisture_value.checked_ilog10().map_or(1, |d| d as usize + 1);
        let mut len = r#"{"moisture_value":}"#.len() + digits;
        if let Some(id) = self.device_id {
            len += r#""device_id":"","#.len() + id.chars().map(escaped_len).sum::<usize>();
        }
        len
    }
}

/// Bytes `c` takes inside a JSON string
fn escaped_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\u{08}' | '\t' | '\n' | '\u{0C}' | '\r' => 2,
        '\u{00}'..='\u{1F}' => 6,
        c => c.len_utf8(),
    }
}

/// Serializes readings into fixed-capacity payloads
#[derive(Debug, Clone, Copy)]
pub struct PayloadEncoder {
    placement: IdentityPlacement,
    capacity: usize,
}

impl PayloadEncoder {
    /// Encoder using the whole payload buffer
    pub fn new(placement: IdentityPlacement) -> Self {
        Self {
            placement,
            capacity: PAYLOAD_CAPACITY,
        }
    }

    /// Encoder with a smaller budget than the payload buffer
    pub fn with_capacity(placement: IdentityPlacement, capacity: usize) -> Self {
        Self {
            placement,
            capacity: capacity.min(PAYLOAD_CAPACITY),
        }
    }

    /// Encoder placing the identity where `mode` expects it
    pub fn for_mode(mode: TransportMode) -> Self {
        Self::new(mode.into())
    }

    /// Where this encoder puts the device identity
    pub fn placement(&self) -> IdentityPlacement {
        self.placement
    }

    /// Bytes an encoded payload may take
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Serialize one reading
    pub fn encode(&self, reading: &Reading) -> TelemetryResult<Payload> {
        let wire = WireReading {
            device_id: match self.placement {
                IdentityPlacement::Body => Some(reading.device_id),
                IdentityPlacement::Destination => None,
            },
            moisture_value: reading.value,
        };

        let overflow = TelemetryError::EncodingOverflow {
            required: wire.encoded_len(),
            capacity: self.capacity,
        };
        match serde_json_core::to_vec::<_, PAYLOAD_CAPACITY>(&wire) {
            Ok(payload) if payload.len() <= self.capacity => Ok(payload),
            Ok(_) | Err(serde_json_core::ser::Error::BufferFull) => Err(overflow),
            Err(_) => Err(TelemetryError::EncodingFailure { reason: "serializer error" }),
        }
    }
}
