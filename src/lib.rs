//! # Telemetry Data Simulator
//!
//! Deterministic synthesis of spacecraft-style binary telemetry for
//! exercising frame and packet decoders.
//!
//! ## Features
//!
//! - **Measurands**: typed scalar generators (constants, counters, cycles,
//!   clocks, index/time functions)
//! - **Frames**: fixed-layout frames and round-robin cycle frames
//! - **Packets**: 6-byte length-delimited headers with sequence numbers
//! - **Packet data units**: fixed-size chunks with lossless spillover of
//!   packets across calls
//! - **Layouts**: JSON descriptions of any of the above
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use datasim::dtype::Dtype;
//! use datasim::measurand::{Constant, Counter};
//! use datasim::packet::{Packet, PacketDataUnit};
//!
//! let packet = Packet::new(5, vec![
//!     Box::new(Counter::new(0, 1, Dtype::U2).unwrap()),
//!     Box::new(Constant::new(0x7F, Dtype::U1).unwrap()),
//! ]).unwrap();
//! let mut pdu = PacketDataUnit::new(16, vec![packet], vec![5]).unwrap();
//!
//! let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let chunk = pdu.generate(0, t).unwrap();
//! assert_eq!(chunk.len(), 16);
//! ```
//!
//! ## Architecture
//!
//! - [`dtype`] - Fixed-width integer kinds and serialized samples
//! - [`measurand`] - Scalar generators
//! - [`frame`] - Frames and cycle frames
//! - [`packet`] - Packets and packet data units
//! - [`generator`] - Common byte-producing interface
//! - [`config`] - JSON layouts
//! - [`sim`] - Fixed-period driver writing to any sink

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod dtype;
pub mod error;
pub mod frame;
pub mod generator;
pub mod measurand;
pub mod packet;
pub mod sim;

/// Point in time a sample is generated for. The core never reads the wall
/// clock; callers supply it.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// Re-export main public types for convenience
pub use config::LayoutConfig;
pub use dtype::{Dtype, Sample};
pub use error::{Result, SimError};
pub use frame::{CycleFrame, Frame};
pub use generator::Generator;
pub use measurand::Measurand;
pub use packet::{Packet, PacketDataUnit};
pub use sim::{RunStats, Simulation};
