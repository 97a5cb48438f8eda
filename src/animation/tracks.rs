use crate::animation::values::Interpolatable;
use crate::errors::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
}

/// A keyed animation channel: sorted times and one value per key.
///
/// Sampling outside the keyed range extrapolates by clamping to the boundary
/// key, never by erroring.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, rejecting structurally invalid key data. Decoders call
    /// this at the parse boundary; the evaluation pass assumes validity.
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        if times.is_empty() {
            return Err(ViewerError::InvalidTrack("no keyframes".into()));
        }
        if times.len() != values.len() {
            return Err(ViewerError::InvalidTrack(format!(
                "{} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ViewerError::InvalidTrack("times not sorted".into()));
        }

        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn duration(&self) -> f32 {
        *self.times.last().unwrap_or(&0.0)
    }

    /// Samples the track at `time`, clamping before the first and after the
    /// last keyframe.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        // partition_point finds the first key strictly after `time`.
        let next = self.times.partition_point(|&t| t <= time);

        if next == 0 {
            return self.values[0];
        }

        let index = next - 1;
        if index + 1 >= self.times.len() {
            return self.values[self.times.len() - 1];
        }

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                let t0 = self.times[index];
                let t1 = self.times[index + 1];
                let dt = t1 - t0;

                let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
                let t = t.clamp(0.0, 1.0);

                T::interpolate_linear(self.values[index], self.values[index + 1], t)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(mode: InterpolationMode) -> KeyframeTrack<f32> {
        KeyframeTrack::new(vec![0.0, 1.0, 2.0], vec![10.0, 20.0, 40.0], mode).unwrap()
    }

    #[test]
    fn sample_interpolates_between_keys() {
        let t = track(InterpolationMode::Linear);
        assert!((t.sample(0.5) - 15.0).abs() < 1e-5);
        assert!((t.sample(1.5) - 30.0).abs() < 1e-5);
    }

    #[test]
    fn sample_clamps_out_of_range_times() {
        let t = track(InterpolationMode::Linear);
        assert!((t.sample(-5.0) - 10.0).abs() < 1e-5);
        assert!((t.sample(99.0) - 40.0).abs() < 1e-5);
    }

    #[test]
    fn step_mode_holds_previous_key() {
        let t = track(InterpolationMode::Step);
        assert!((t.sample(0.99) - 10.0).abs() < 1e-5);
        assert!((t.sample(1.0) - 20.0).abs() < 1e-5);
    }

    #[test]
    fn new_rejects_bad_key_data() {
        assert!(KeyframeTrack::<f32>::new(vec![], vec![], InterpolationMode::Linear).is_err());
        assert!(
            KeyframeTrack::new(vec![0.0, 1.0], vec![1.0], InterpolationMode::Linear).is_err()
        );
        assert!(
            KeyframeTrack::new(vec![1.0, 0.0], vec![1.0, 2.0], InterpolationMode::Linear).is_err()
        );
    }
}
