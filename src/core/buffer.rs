//! Probe samples and the observable buffer holding the selected profile's samples

use serde::{Deserialize, Serialize};
use tracing::trace;

/// One probed point: physical position plus measured height
///
/// Serialized as `[x, y, z]`, the shape the server pushes and persists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct ProbeSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ProbeSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for ProbeSample {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<ProbeSample> for [f64; 3] {
    fn from(s: ProbeSample) -> Self {
        [s.x, s.y, s.z]
    }
}

/// Receives the full sample sequence after every buffer mutation
pub trait BufferObserver {
    fn buffer_changed(&mut self, samples: &[ProbeSample]);
}

impl BufferObserver for () {
    fn buffer_changed(&mut self, _samples: &[ProbeSample]) {}
}

/// Ordered sample sequence that notifies its observer exactly once per mutation
pub struct ProbeBuffer<O> {
    samples: Vec<ProbeSample>,
    observer: O,
}

impl<O: BufferObserver> ProbeBuffer<O> {
    pub fn new(observer: O) -> Self {
        Self {
            samples: Vec::new(),
            observer,
        }
    }

    /// Clear all samples (probe start)
    pub fn reset(&mut self) {
        self.samples.clear();
        trace!("Probe buffer reset");
        self.notify();
    }

    /// Append one inbound sample
    pub fn append(&mut self, sample: ProbeSample) {
        self.samples.push(sample);
        trace!(len = self.samples.len(), x = sample.x, y = sample.y, z = sample.z, "Sample appended");
        self.notify();
    }

    /// Replace the whole sequence (profile switch, initial load)
    pub fn replace_all(&mut self, samples: Vec<ProbeSample>) {
        self.samples = samples;
        trace!(len = self.samples.len(), "Probe buffer replaced");
        self.notify();
    }

    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access for reconfiguring the observer (e.g. new bounds).
    /// Does not notify.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    fn notify(&mut self) {
        self.observer.buffer_changed(&self.samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the length seen on each notification
    #[derive(Default)]
    struct Notifications(Vec<usize>);

    impl BufferObserver for Notifications {
        fn buffer_changed(&mut self, samples: &[ProbeSample]) {
            self.0.push(samples.len());
        }
    }

    #[test]
    fn test_each_mutation_notifies_once() {
        let mut buffer = ProbeBuffer::new(Notifications::default());

        buffer.replace_all(vec![ProbeSample::new(0.0, 0.0, 0.1); 4]);
        buffer.reset();
        buffer.append(ProbeSample::new(1.0, 2.0, 3.5));

        assert_eq!(buffer.observer().0, vec![4, 0, 1]);
    }

    #[test]
    fn test_reset_then_append_keeps_order() {
        let mut buffer = ProbeBuffer::new(());
        buffer.replace_all(vec![ProbeSample::new(9.0, 9.0, 9.0)]);
        buffer.reset();

        let expected: Vec<ProbeSample> = (0..25)
            .map(|i| ProbeSample::new(i as f64 * 10.0, (i % 5) as f64, i as f64 * 0.01))
            .collect();
        for s in &expected {
            buffer.append(*s);
        }

        assert_eq!(buffer.samples(), expected.as_slice());
    }

    #[test]
    fn test_sample_serializes_as_triple() {
        let s = ProbeSample::new(1.0, 2.0, 3.5);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[1.0,2.0,3.5]");

        let back: ProbeSample = serde_json::from_str("[0, 50, -0.25]").unwrap();
        assert_eq!(back, ProbeSample::new(0.0, 50.0, -0.25));
    }
}
