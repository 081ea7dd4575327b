use crate::error::Result;
use crate::generator::Generator;
use crate::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info};

/// Totals for one [`Simulation::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub samples: u64,
    pub bytes_written: u64,
    pub first_index: u64,
    pub first_timestamp: Timestamp,
    pub last_timestamp: Option<Timestamp>,
}

/// Drives a generator at a fixed sample period, starting from a caller
/// supplied time. Index and timestamp advance together on every step.
#[derive(Debug)]
pub struct Simulation<G> {
    generator: G,
    index: u64,
    timestamp: Timestamp,
    period: Duration,
}

impl<G: Generator> Simulation<G> {
    pub fn new(generator: G, start: Timestamp, period: Duration) -> Self {
        Self {
            generator,
            index: 0,
            timestamp: start,
            period,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Generates the sample at the current `(index, timestamp)` and advances.
    pub fn step(&mut self) -> Result<Vec<u8>> {
        let data = self.generator.generate(self.index, self.timestamp)?;
        debug!(
            index = self.index,
            timestamp = %self.timestamp,
            len = data.len(),
            "sample generated"
        );
        self.index += 1;
        self.timestamp += self.period;
        Ok(data)
    }

    /// Writes `count` samples to `sink`, back to back.
    pub fn run<W: Write>(&mut self, count: u64, sink: &mut W) -> Result<RunStats> {
        info!(
            count,
            start_index = self.index,
            layout = %self.generator.describe(),
            "simulation run started"
        );

        let mut stats = RunStats {
            samples: 0,
            bytes_written: 0,
            first_index: self.index,
            first_timestamp: self.timestamp,
            last_timestamp: None,
        };

        for _ in 0..count {
            let timestamp = self.timestamp;
            let data = self.step()?;
            sink.write_all(&data)?;
            stats.samples += 1;
            stats.bytes_written += data.len() as u64;
            stats.last_timestamp = Some(timestamp);
        }
        sink.flush()?;

        info!(
            samples = stats.samples,
            bytes = stats.bytes_written,
            "simulation run finished"
        );
        Ok(stats)
    }
}

impl<G: Generator> Iterator for Simulation<G> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Dtype;
    use crate::frame::Frame;
    use crate::measurand::{Clock, IndexFunction};
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
    }

    fn index_and_clock() -> Frame {
        Frame::new(vec![
            Box::new(IndexFunction::passthrough(Dtype::U1)),
            Box::new(Clock::new(t0(), Dtype::U2)),
        ])
    }

    #[test]
    fn test_step_advances_index_and_time() {
        let mut sim = Simulation::new(index_and_clock(), t0(), Duration::seconds(2));
        assert_eq!(sim.step().unwrap(), vec![0, 0, 0]);
        assert_eq!(sim.step().unwrap(), vec![1, 0, 2]);
        assert_eq!(sim.step().unwrap(), vec![2, 0, 4]);
        assert_eq!(sim.index(), 3);
        assert_eq!(sim.timestamp(), t0() + Duration::seconds(6));
    }

    #[test]
    fn test_run_writes_all_samples() {
        let mut sim = Simulation::new(index_and_clock(), t0(), Duration::seconds(1));
        let mut sink = Vec::new();
        let stats = sim.run(4, &mut sink).unwrap();

        assert_eq!(sink, vec![0, 0, 0, 1, 0, 1, 2, 0, 2, 3, 0, 3]);
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.bytes_written, 12);
        assert_eq!(stats.first_index, 0);
        assert_eq!(stats.first_timestamp, t0());
        assert_eq!(stats.last_timestamp, Some(t0() + Duration::seconds(3)));
    }

    #[test]
    fn test_empty_run() {
        let mut sim = Simulation::new(index_and_clock(), t0(), Duration::seconds(1));
        let mut sink = Vec::new();
        let stats = sim.run(0, &mut sink).unwrap();
        assert!(sink.is_empty());
        assert_eq!(stats.last_timestamp, None);
    }

    #[test]
    fn test_iterator_matches_steps() {
        let sim = Simulation::new(index_and_clock(), t0(), Duration::seconds(1));
        let firsts: Vec<u8> = sim.take(3).map(|s| s.unwrap()[0]).collect();
        assert_eq!(firsts, vec![0, 1, 2]);
    }
}
