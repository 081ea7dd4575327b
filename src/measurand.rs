//! Typed scalar generators.
//!
//! Each measurand yields one [`Sample`] per call. `Counter` and `Cycle` keep
//! a cursor; the others are pure functions of the call arguments.

use crate::dtype::{Dtype, Sample};
use crate::error::{Result, SimError};
use crate::Timestamp;
use std::fmt;
use tracing::trace;

/// A telemetry channel producing one typed value per sample.
pub trait Measurand: fmt::Debug + Send {
    fn dtype(&self) -> Dtype;

    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Sample;

    /// Serialized width of every sample this measurand produces.
    fn width(&self) -> usize {
        self.dtype().width()
    }
}

/// Boxed measurand as held by frames and packets.
pub type BoxedMeasurand = Box<dyn Measurand>;

/// Folds an unvalidated value into `dtype`, noting when it had to wrap.
fn cast(value: i128, dtype: Dtype, source: &'static str) -> Sample {
    if !dtype.contains(value) {
        trace!(value, %dtype, source, "value truncated to dtype width");
    }
    Sample::new(value, dtype)
}

#[derive(Debug, Clone)]
pub struct Constant {
    value: i128,
    dtype: Dtype,
}

impl Constant {
    pub fn new(value: impl Into<i128>, dtype: Dtype) -> Result<Self> {
        let value = dtype.check(value.into())?;
        Ok(Self { value, dtype })
    }
}

impl Measurand for Constant {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, _index: u64, _timestamp: Timestamp) -> Sample {
        Sample::new(self.value, self.dtype)
    }
}

/// Fixed-width hardware counter: `(start + n * step) mod 2^(8 * width)`.
#[derive(Debug, Clone)]
pub struct Counter {
    next: i128,
    step: i128,
    dtype: Dtype,
}

impl Counter {
    pub fn new(start: impl Into<i128>, step: impl Into<i128>, dtype: Dtype) -> Result<Self> {
        let next = dtype.check(start.into())?;
        // Reduced once so `next + step` stays within i128 for any step.
        let step = step.into().rem_euclid(dtype.modulus());
        Ok(Self { next, step, dtype })
    }
}

impl Measurand for Counter {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, _index: u64, _timestamp: Timestamp) -> Sample {
        let current = self.next;
        self.next = self.dtype.wrap(current + self.step);
        Sample::new(current, self.dtype)
    }
}

/// Repeats a fixed list of values forever.
#[derive(Debug, Clone)]
pub struct Cycle {
    values: Vec<i128>,
    position: usize,
    dtype: Dtype,
}

impl Cycle {
    pub fn new<I, V>(values: I, dtype: Dtype) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<i128>,
    {
        let values = values
            .into_iter()
            .map(|v| dtype.check(v.into()))
            .collect::<Result<Vec<_>>>()?;
        if values.is_empty() {
            return Err(SimError::EmptyCycle);
        }
        Ok(Self {
            values,
            position: 0,
            dtype,
        })
    }
}

impl Measurand for Cycle {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, _index: u64, _timestamp: Timestamp) -> Sample {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.values.len();
        Sample::new(value, self.dtype)
    }
}

/// Whole seconds elapsed since `epoch`, rounded toward negative infinity.
#[derive(Debug, Clone)]
pub struct Clock {
    epoch: Timestamp,
    dtype: Dtype,
}

impl Clock {
    pub fn new(epoch: Timestamp, dtype: Dtype) -> Self {
        Self { epoch, dtype }
    }

    fn elapsed_seconds(&self, timestamp: Timestamp) -> i64 {
        let elapsed = timestamp - self.epoch;
        let secs = elapsed.num_seconds();
        // num_seconds truncates toward zero
        if elapsed < chrono::Duration::seconds(secs) {
            secs - 1
        } else {
            secs
        }
    }
}

impl Measurand for Clock {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, _index: u64, timestamp: Timestamp) -> Sample {
        cast(self.elapsed_seconds(timestamp).into(), self.dtype, "clock")
    }
}

/// Applies a caller-supplied function to the sample timestamp.
pub struct TimeFunction {
    func: Box<dyn Fn(Timestamp) -> i64 + Send>,
    dtype: Dtype,
}

impl TimeFunction {
    pub fn new(func: impl Fn(Timestamp) -> i64 + Send + 'static, dtype: Dtype) -> Self {
        Self {
            func: Box::new(func),
            dtype,
        }
    }

    /// Seconds since the Unix epoch.
    pub fn unix_seconds(dtype: Dtype) -> Self {
        Self::new(|t| t.timestamp(), dtype)
    }
}

impl fmt::Debug for TimeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeFunction")
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

impl Measurand for TimeFunction {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, _index: u64, timestamp: Timestamp) -> Sample {
        cast((self.func)(timestamp).into(), self.dtype, "time function")
    }
}

/// Applies a caller-supplied function to the sample index.
pub struct IndexFunction {
    func: Box<dyn Fn(u64) -> i64 + Send>,
    dtype: Dtype,
}

impl IndexFunction {
    pub fn new(func: impl Fn(u64) -> i64 + Send + 'static, dtype: Dtype) -> Self {
        Self {
            func: Box::new(func),
            dtype,
        }
    }

    /// Emits the sample index itself.
    pub fn passthrough(dtype: Dtype) -> Self {
        Self::new(|x| x as i64, dtype)
    }
}

impl fmt::Debug for IndexFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexFunction")
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

impl Measurand for IndexFunction {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn generate(&mut self, index: u64, _timestamp: Timestamp) -> Sample {
        cast((self.func)(index).into(), self.dtype, "index function")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_constant_repeats() {
        let mut m = Constant::new(-5, Dtype::I1).unwrap();
        for i in 0..10 {
            assert_eq!(m.generate(i, t0()).value(), -5);
        }
    }

    #[test]
    fn test_constant_out_of_range() {
        assert!(matches!(
            Constant::new(256, Dtype::U1),
            Err(SimError::OutOfRange { value: 256, .. })
        ));
        assert!(Constant::new(-1, Dtype::U4).is_err());
    }

    #[test]
    fn test_counter_wraps() {
        let mut m = Counter::new(254, 1, Dtype::U1).unwrap();
        let values: Vec<_> = (0..4).map(|_| m.generate(0, t0()).value()).collect();
        assert_eq!(values, vec![254, 255, 0, 1]);
    }

    #[test]
    fn test_counter_negative_step() {
        let mut m = Counter::new(1, -1, Dtype::U2).unwrap();
        let values: Vec<_> = (0..3).map(|_| m.generate(0, t0()).value()).collect();
        assert_eq!(values, vec![1, 0, 65535]);
    }

    #[test]
    fn test_counter_huge_step_wraps() {
        let mut m = Counter::new(0, i128::MAX, Dtype::U8).unwrap();
        let values: Vec<_> = (0..3).map(|_| m.generate(0, t0()).value()).collect();
        let step = i128::MAX.rem_euclid(1 << 64);
        assert_eq!(values, vec![0, step, (2 * step).rem_euclid(1 << 64)]);

        let mut m = Counter::new(0, i128::MIN, Dtype::I1).unwrap();
        assert_eq!(m.generate(0, t0()).value(), 0);
        assert_eq!(m.generate(0, t0()).value(), 0);
    }

    #[test]
    fn test_counter_signed_folds() {
        let mut m = Counter::new(126, 1, Dtype::I1).unwrap();
        let values: Vec<_> = (0..4).map(|_| m.generate(0, t0()).value()).collect();
        assert_eq!(values, vec![126, 127, -128, -127]);

        let mut m = Counter::new(-32767, -2, Dtype::I2).unwrap();
        let values: Vec<_> = (0..3).map(|_| m.generate(0, t0()).value()).collect();
        assert_eq!(values, vec![-32767, 32767, 32765]);
    }

    #[test]
    fn test_counter_validates_start() {
        assert!(Counter::new(70000, 1, Dtype::U2).is_err());
    }

    #[test]
    fn test_cycle_restarts() {
        let mut m = Cycle::new([3, 1, 2], Dtype::U1).unwrap();
        let values: Vec<_> = (0..7).map(|_| m.generate(0, t0()).value()).collect();
        assert_eq!(values, vec![3, 1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_cycle_rejects_empty_and_out_of_range() {
        assert!(matches!(
            Cycle::new(Vec::<i64>::new(), Dtype::U1),
            Err(SimError::EmptyCycle)
        ));
        assert!(Cycle::new([1, 300], Dtype::U1).is_err());
    }

    #[test]
    fn test_clock_elapsed_seconds() {
        let mut m = Clock::new(t0(), Dtype::U4);
        let t = t0() + Duration::milliseconds(90_500);
        assert_eq!(m.generate(0, t).value(), 90);
    }

    #[test]
    fn test_clock_floors_before_epoch() {
        let mut m = Clock::new(t0(), Dtype::I4);
        let t = t0() - Duration::milliseconds(1500);
        assert_eq!(m.generate(0, t).value(), -2);
    }

    #[test]
    fn test_clock_truncates_out_of_range() {
        let mut m = Clock::new(t0(), Dtype::U1);
        let t = t0() + Duration::seconds(300);
        assert_eq!(m.generate(0, t).value(), 300 - 256);
    }

    #[test]
    fn test_function_measurands_truncate() {
        let mut by_index = IndexFunction::passthrough(Dtype::U1);
        assert_eq!(by_index.generate(300, t0()).value(), 44);
        assert_eq!(by_index.generate(255, t0()).value(), 255);

        let mut negative = IndexFunction::new(|x| -(x as i64), Dtype::U2);
        assert_eq!(negative.generate(1, t0()).value(), 65535);

        // 1_577_836_800 mod 65536 is 57600, which folds negative in an i2
        let mut by_time = TimeFunction::unix_seconds(Dtype::I2);
        assert_eq!(by_time.generate(0, t0()).value(), 57_600 - 65_536);
    }

    #[test]
    fn test_function_measurands() {
        let mut by_index = IndexFunction::new(|x| (x * 2) as i64, Dtype::U2);
        assert_eq!(by_index.generate(21, t0()).value(), 42);

        let mut by_time = TimeFunction::unix_seconds(Dtype::U4);
        assert_eq!(by_time.generate(0, t0()).value(), 1_577_836_800);
    }
}
