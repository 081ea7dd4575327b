use crate::dtype::Dtype;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("value {value} is out of range for {dtype} ({min}..={max})")]
    OutOfRange {
        value: i128,
        dtype: Dtype,
        min: i128,
        max: i128,
    },

    #[error("cycle measurand requires at least one value")]
    EmptyCycle,

    #[error("frames must have the same number of measurands, but have: {lengths:?}")]
    FrameLengthMismatch { lengths: Vec<usize> },

    #[error("cycle frame requires at least one frame")]
    EmptyCycleFrame,

    #[error("cycle frame holds {count} frames but the rotation index is a single byte (max 256)")]
    TooManyFrames { count: usize },

    #[error("packet ID value is {apid} but must be < {limit}")]
    ApidTooLarge { apid: u32, limit: u32 },

    #[error("packet {apid} has no measurands")]
    EmptyPacket { apid: u16 },

    #[error("packet {apid} payload is {len} bytes, the length field allows at most {max}")]
    PayloadTooLarge { apid: u16, len: usize, max: usize },

    #[error("duplicate packet ID {apid} in packet data unit")]
    DuplicateApid { apid: u16 },

    #[error("packet data unit schedule is empty")]
    EmptySchedule,

    #[error("packet data unit size is {size} bytes but must be at least {min}")]
    InvalidPduSize { size: usize, min: usize },

    #[error("unknown dtype identifier '{0}'")]
    InvalidDtype(String),

    #[error("no packet configured for scheduled apid {apid}")]
    ScheduleLookup { apid: u16 },

    #[error("layout configuration error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// True for errors raised while building a layout, as opposed to while
    /// generating or writing it.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SimError::ScheduleLookup { .. } | SimError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_names_bounds() {
        let err = SimError::OutOfRange {
            value: 300,
            dtype: Dtype::U1,
            min: 0,
            max: 255,
        };
        assert_eq!(err.to_string(), "value 300 is out of range for u1 (0..=255)");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_runtime_errors_are_not_configuration() {
        assert!(!SimError::ScheduleLookup { apid: 3 }.is_configuration());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(!SimError::from(io).is_configuration());
    }
}
