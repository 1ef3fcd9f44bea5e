use rand::Rng;

use crate::config::MIN_TICK_INCREMENT;

/// Supplies the percent points added to the active stage on each tick.
pub trait IncrementSource: Send + Sync {
    fn next_increment(&mut self) -> u8;
}

/// Uniform random increment in `min..=max`. `min` is at least 1 so a run
/// always terminates.
#[derive(Debug, Clone, Copy)]
pub struct RandomIncrement {
    min: u8,
    max: u8,
}

impl RandomIncrement {
    pub fn new(min: u8, max: u8) -> Self {
        let min = min.max(MIN_TICK_INCREMENT);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn up_to(max: u8) -> Self {
        Self::new(MIN_TICK_INCREMENT, max)
    }
}

impl IncrementSource for RandomIncrement {
    fn next_increment(&mut self) -> u8 {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Cycles through a fixed list. Zero entries are bumped to 1.
#[derive(Debug, Clone)]
pub struct SequenceIncrement {
    values: Vec<u8>,
    cursor: usize,
}

impl SequenceIncrement {
    pub fn new(values: impl Into<Vec<u8>>) -> Self {
        let mut values: Vec<u8> = values.into();
        if values.is_empty() {
            values.push(MIN_TICK_INCREMENT);
        }
        Self { values, cursor: 0 }
    }

    pub fn constant(value: u8) -> Self {
        Self::new(vec![value])
    }
}

impl IncrementSource for SequenceIncrement {
    fn next_increment(&mut self) -> u8 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.max(MIN_TICK_INCREMENT)
    }
}
