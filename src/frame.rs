use crate::error::{Result, SimError};
use crate::generator::Generator;
use crate::measurand::BoxedMeasurand;
use crate::Timestamp;
use tracing::debug;

/// Largest number of frames a cycle frame can index with its leading byte.
pub const MAX_CYCLE_FRAMES: usize = 256;

/// Fixed ordered composition of measurands into one byte sequence.
#[derive(Debug)]
pub struct Frame {
    sources: Vec<BoxedMeasurand>,
    msbf: bool,
}

impl Frame {
    /// Most-significant-byte-first frame.
    pub fn new(sources: Vec<BoxedMeasurand>) -> Self {
        Self::with_byte_order(sources, true)
    }

    pub fn with_byte_order(sources: Vec<BoxedMeasurand>, msbf: bool) -> Self {
        Self { sources, msbf }
    }

    pub fn measurand_count(&self) -> usize {
        self.sources.len()
    }

    pub fn msbf(&self) -> bool {
        self.msbf
    }

    /// Output length in bytes, fixed for the frame's lifetime.
    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.width()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generate(&mut self, index: u64, timestamp: Timestamp) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.len());
        for source in &mut self.sources {
            data.extend_from_slice(&source.generate(index, timestamp).to_bytes(self.msbf));
        }
        debug_assert_eq!(data.len(), self.len());
        data
    }
}

impl Generator for Frame {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        Ok(Frame::generate(self, index, timestamp))
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn describe(&self) -> String {
        format!(
            "frame: {} measurands, {} bytes, {}",
            self.measurand_count(),
            self.len(),
            if self.msbf { "msbf" } else { "lsbf" }
        )
    }
}

/// Round-robins over frames, prefixing each output with the frame index.
#[derive(Debug)]
pub struct CycleFrame {
    frames: Vec<Frame>,
    cursor: usize,
}

impl CycleFrame {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(SimError::EmptyCycleFrame);
        }
        if frames.len() > MAX_CYCLE_FRAMES {
            return Err(SimError::TooManyFrames {
                count: frames.len(),
            });
        }

        let lengths: Vec<usize> = frames.iter().map(Frame::measurand_count).collect();
        if lengths.iter().any(|&l| l != lengths[0]) {
            return Err(SimError::FrameLengthMismatch { lengths });
        }

        debug!(frames = frames.len(), "cycle frame configured");
        Ok(Self { frames, cursor: 0 })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame the next call will emit.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn generate(&mut self, index: u64, timestamp: Timestamp) -> Vec<u8> {
        let idx = self.cursor;
        let frame = &mut self.frames[idx];

        let mut data = Vec::with_capacity(frame.len() + 1);
        data.push(idx as u8);
        data.extend(frame.generate(index, timestamp));

        self.cursor = (idx + 1) % self.frames.len();
        data
    }
}

impl Generator for CycleFrame {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        Ok(CycleFrame::generate(self, index, timestamp))
    }

    /// Frames are only checked for equal measurand counts, so the length is
    /// reported only when their byte sizes agree as well.
    fn output_len(&self) -> Option<usize> {
        let first = self.frames[0].len();
        self.frames
            .iter()
            .all(|f| f.len() == first)
            .then_some(first + 1)
    }

    fn describe(&self) -> String {
        format!(
            "cycle frame: {} frames of {} measurands",
            self.frames.len(),
            self.frames[0].measurand_count()
        )
    }
}
