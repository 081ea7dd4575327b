//! JSON layout descriptions.
//!
//! A layout names one top-level generator and everything beneath it:
//!
//! ```json
//! {
//!   "type": "pdu",
//!   "size": 64,
//!   "packets": [
//!     { "apid": 5, "sources": [ { "type": "counter", "dtype": "u2" } ] }
//!   ],
//!   "cycle": [5]
//! }
//! ```

use crate::dtype::Dtype;
use crate::error::Result;
use crate::frame::{CycleFrame, Frame};
use crate::generator::Generator;
use crate::measurand::{
    BoxedMeasurand, Clock, Constant, Counter, Cycle, IndexFunction, TimeFunction,
};
use crate::packet::{Packet, PacketDataUnit};
use crate::Timestamp;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

fn default_dtype() -> Dtype {
    Dtype::U1
}

fn default_clock_dtype() -> Dtype {
    Dtype::U4
}

fn default_step() -> Literal {
    Literal(1)
}

fn default_msbf() -> bool {
    true
}

/// Integer written in a layout. Covers both the `i64` and `u64` ranges, so
/// the bounds of every dtype can be spelled out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Literal(pub i128);

impl From<i128> for Literal {
    fn from(value: i128) -> Self {
        Literal(value)
    }
}

impl From<Literal> for i128 {
    fn from(literal: Literal) -> Self {
        literal.0
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Ok(v) = i64::try_from(self.0) {
            serializer.serialize_i64(v)
        } else if let Ok(v) = u64::try_from(self.0) {
            serializer.serialize_u64(v)
        } else {
            serializer.serialize_i128(self.0)
        }
    }
}

struct LiteralVisitor;

impl<'de> Visitor<'de> for LiteralVisitor {
    type Value = Literal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer in the i64 or u64 range")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Literal, E> {
        Ok(Literal(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Literal, E> {
        Ok(Literal(v.into()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Literal, E> {
        Ok(Literal(v))
    }
}

// Tagged enums buffer their fields and only keep 64-bit integers, hence
// `deserialize_any` rather than `deserialize_i128`.
impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiteralVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeasurandConfig {
    Constant {
        value: Literal,
        #[serde(default = "default_dtype")]
        dtype: Dtype,
    },
    Counter {
        #[serde(default)]
        start: Literal,
        #[serde(default = "default_step")]
        step: Literal,
        #[serde(default = "default_dtype")]
        dtype: Dtype,
    },
    Cycle {
        values: Vec<Literal>,
        #[serde(default = "default_dtype")]
        dtype: Dtype,
    },
    Clock {
        epoch: Timestamp,
        #[serde(default = "default_clock_dtype")]
        dtype: Dtype,
    },
    /// The sample index itself.
    Index {
        #[serde(default = "default_dtype")]
        dtype: Dtype,
    },
    /// Seconds since the Unix epoch.
    UnixTime {
        #[serde(default = "default_clock_dtype")]
        dtype: Dtype,
    },
}

impl MeasurandConfig {
    pub fn build(&self) -> Result<BoxedMeasurand> {
        let measurand: BoxedMeasurand = match *self {
            MeasurandConfig::Constant { value, dtype } => Box::new(Constant::new(value, dtype)?),
            MeasurandConfig::Counter { start, step, dtype } => {
                Box::new(Counter::new(start, step, dtype)?)
            }
            MeasurandConfig::Cycle { ref values, dtype } => {
                Box::new(Cycle::new(values.iter().copied(), dtype)?)
            }
            MeasurandConfig::Clock { epoch, dtype } => Box::new(Clock::new(epoch, dtype)),
            MeasurandConfig::Index { dtype } => Box::new(IndexFunction::passthrough(dtype)),
            MeasurandConfig::UnixTime { dtype } => Box::new(TimeFunction::unix_seconds(dtype)),
        };
        Ok(measurand)
    }
}

fn build_sources(sources: &[MeasurandConfig]) -> Result<Vec<BoxedMeasurand>> {
    sources.iter().map(MeasurandConfig::build).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub sources: Vec<MeasurandConfig>,
    #[serde(default = "default_msbf")]
    pub msbf: bool,
}

impl FrameConfig {
    pub fn build(&self) -> Result<Frame> {
        Ok(Frame::with_byte_order(build_sources(&self.sources)?, self.msbf))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketConfig {
    pub apid: u32,
    pub sources: Vec<MeasurandConfig>,
}

impl PacketConfig {
    pub fn build(&self) -> Result<Packet> {
        Packet::new(self.apid, build_sources(&self.sources)?)
    }
}

/// Top-level generator layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutConfig {
    Frame(FrameConfig),
    CycleFrame {
        frames: Vec<FrameConfig>,
    },
    Packet(PacketConfig),
    Pdu {
        size: usize,
        packets: Vec<PacketConfig>,
        cycle: Vec<u16>,
    },
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let layout = Self::from_json(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), "layout loaded");
        Ok(layout)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the generator, validating every component eagerly.
    pub fn build(&self) -> Result<Box<dyn Generator>> {
        let generator: Box<dyn Generator> = match self {
            LayoutConfig::Frame(frame) => Box::new(frame.build()?),
            LayoutConfig::CycleFrame { frames } => {
                let frames = frames
                    .iter()
                    .map(FrameConfig::build)
                    .collect::<Result<Vec<_>>>()?;
                Box::new(CycleFrame::new(frames)?)
            }
            LayoutConfig::Packet(packet) => Box::new(packet.build()?),
            LayoutConfig::Pdu {
                size,
                packets,
                cycle,
            } => {
                let packets = packets
                    .iter()
                    .map(PacketConfig::build)
                    .collect::<Result<Vec<_>>>()?;
                Box::new(PacketDataUnit::new(*size, packets, cycle.clone())?)
            }
        };
        Ok(generator)
    }
}
