//! Length-delimited application packets and their multiplexing into
//! fixed-size packet data units.
//!
//! A packet is a 6-byte header of three big-endian `u16` fields
//! `(apid, sequence, payload_len - 1)` followed by the payload. A packet data
//! unit emits exactly `size` bytes per call, starting with a 2-byte pointer
//! giving the number of continuation bytes carried over from the previous
//! call, so a decoder can find the first new packet header.

use crate::error::{Result, SimError};
use crate::generator::Generator;
use crate::measurand::BoxedMeasurand;
use crate::Timestamp;
use static_assertions::const_assert_eq;
use std::collections::HashMap;
use tracing::{debug, trace};

pub const HEADER_LEN: usize = 6;
pub const POINTER_LEN: usize = 2;

/// Application ids are 11-bit values.
pub const APID_LIMIT: u32 = 1 << 11;

/// Largest payload the `payload_len - 1` field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize + 1;

const_assert_eq!(HEADER_LEN, 3 * std::mem::size_of::<u16>());
const_assert_eq!(POINTER_LEN, std::mem::size_of::<u16>());

#[derive(Debug)]
pub struct Packet {
    apid: u16,
    sources: Vec<BoxedMeasurand>,
    sequence: u16,
    payload_len: usize,
}

impl Packet {
    pub fn new(apid: u32, sources: Vec<BoxedMeasurand>) -> Result<Self> {
        if apid >= APID_LIMIT {
            return Err(SimError::ApidTooLarge {
                apid,
                limit: APID_LIMIT,
            });
        }
        let apid = apid as u16;

        if sources.is_empty() {
            return Err(SimError::EmptyPacket { apid });
        }

        let payload_len: usize = sources.iter().map(|s| s.width()).sum();
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(SimError::PayloadTooLarge {
                apid,
                len: payload_len,
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(Self {
            apid,
            sources,
            sequence: 0,
            payload_len,
        })
    }

    pub fn apid(&self) -> u16 {
        self.apid
    }

    /// Sequence number the next call will carry.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Total packet length, header included.
    pub fn len(&self) -> usize {
        HEADER_LEN + self.payload_len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn header(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0..2].copy_from_slice(&self.apid.to_be_bytes());
        header[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        header[4..6].copy_from_slice(&((self.payload_len - 1) as u16).to_be_bytes());
        header
    }

    pub fn generate(&mut self, index: u64, timestamp: Timestamp) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.len());
        data.extend_from_slice(&self.header());
        for source in &mut self.sources {
            data.extend_from_slice(&source.generate(index, timestamp).to_bytes(true));
        }

        // NASA Rule 5: payload length is fixed at construction
        debug_assert_eq!(data.len(), self.len());

        // Sequence numbers wrap with the 16-bit header field.
        self.sequence = self.sequence.wrapping_add(1);
        data
    }
}

impl Generator for Packet {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        Ok(Packet::generate(self, index, timestamp))
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn describe(&self) -> String {
        format!(
            "packet {}: {} measurands, {} bytes",
            self.apid,
            self.sources.len(),
            self.len()
        )
    }
}

/// Packs a cyclic schedule of packets into fixed-size chunks, carrying the
/// overflow of the last packet into the next call.
#[derive(Debug)]
pub struct PacketDataUnit {
    size: usize,
    packets: HashMap<u16, Packet>,
    schedule: Vec<u16>,
    next_slot: usize,
    spillover: Vec<u8>,
}

impl PacketDataUnit {
    pub fn new(size: usize, packets: Vec<Packet>, cycle: Vec<u16>) -> Result<Self> {
        if size < POINTER_LEN {
            return Err(SimError::InvalidPduSize {
                size,
                min: POINTER_LEN,
            });
        }
        if cycle.is_empty() {
            return Err(SimError::EmptySchedule);
        }

        let mut by_apid = HashMap::with_capacity(packets.len());
        for packet in packets {
            // Spillover never exceeds one packet less a byte, which must fit
            // in the 16-bit pointer.
            if packet.len() > MAX_PAYLOAD_LEN {
                return Err(SimError::PayloadTooLarge {
                    apid: packet.apid(),
                    len: packet.payload_len(),
                    max: MAX_PAYLOAD_LEN - HEADER_LEN,
                });
            }
            let apid = packet.apid();
            if by_apid.insert(apid, packet).is_some() {
                return Err(SimError::DuplicateApid { apid });
            }
        }

        if let Some(&apid) = cycle.iter().find(|apid| !by_apid.contains_key(apid)) {
            return Err(SimError::ScheduleLookup { apid });
        }

        debug!(
            size,
            packets = by_apid.len(),
            schedule_len = cycle.len(),
            "packet data unit configured"
        );

        Ok(Self {
            size,
            packets: by_apid,
            schedule: cycle,
            next_slot: 0,
            spillover: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Bytes carried over into the next call.
    pub fn spillover(&self) -> &[u8] {
        &self.spillover
    }

    pub fn packet(&self, apid: u16) -> Option<&Packet> {
        self.packets.get(&apid)
    }

    fn next_apid(&mut self) -> u16 {
        let apid = self.schedule[self.next_slot];
        self.next_slot = (self.next_slot + 1) % self.schedule.len();
        apid
    }

    pub fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        let fpp = self.spillover.len();
        debug_assert!(fpp <= u16::MAX as usize, "spillover {fpp} overflows pointer");

        let mut data = Vec::with_capacity(self.size.max(POINTER_LEN + fpp));
        data.extend_from_slice(&(fpp as u16).to_be_bytes());
        // Copied, not drained: a failed lookup below must leave it in place.
        data.extend_from_slice(&self.spillover);

        while data.len() < self.size {
            let apid = self.next_apid();
            let packet = self
                .packets
                .get_mut(&apid)
                .ok_or(SimError::ScheduleLookup { apid })?;
            let bytes = packet.generate(index, timestamp);
            trace!(apid, len = bytes.len(), "packet appended");
            data.extend(bytes);
        }

        self.spillover = data.split_off(self.size);
        trace!(fpp, spillover = self.spillover.len(), "pdu generated");
        Ok(data)
    }
}

impl Generator for PacketDataUnit {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        PacketDataUnit::generate(self, index, timestamp)
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.size)
    }

    fn describe(&self) -> String {
        let mut apids: Vec<_> = self.packets.keys().copied().collect();
        apids.sort_unstable();
        format!(
            "packet data unit: {} bytes, packets {:?}, schedule {:?}",
            self.size, apids, self.schedule
        )
    }
}
