//! Buffer Sizes and Memory Constraints
//!
//! Fixed capacities for everything the publish path keeps on the stack.

/// Capacity of an encoded payload (bytes).
///
/// Matches the fixed 200-byte JSON document of the field firmware. The
/// largest payload (`device_id` plus a five digit value) stays far below it
/// for any reasonable device identity.
pub const PAYLOAD_CAPACITY: usize = 200;

/// Capacity of the destination topic (bytes).
///
/// `sensors/moisture/` is 17 bytes, leaving 47 bytes for the device identity.
pub const TOPIC_CAPACITY: usize = 64;

/// Capacity of the session client identifier (bytes).
pub const CLIENT_ID_CAPACITY: usize = 64;
