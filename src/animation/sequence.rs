use crate::animation::tracks::KeyframeTrack;
use crate::animation::values::Interpolatable;

/// A named animation clip of a model definition.
///
/// "No sequence selected" is expressed as `None` at the instance level and
/// means the static pose.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    /// Clip length in seconds
    pub duration: f32,
    /// Whether instance time wraps at the end or clamps
    pub looping: bool,
}

impl Sequence {
    #[must_use]
    pub fn new(name: &str, duration: f32, looping: bool) -> Self {
        Self {
            name: name.to_string(),
            duration,
            looping,
        }
    }
}

/// One transform channel of a node: an authored default plus, per sequence,
/// an optional keyframe track.
///
/// Sampling with no active sequence, or within a sequence that does not
/// animate this channel, yields the default.
#[derive(Debug, Clone)]
pub struct AnimatedValue<T: Interpolatable> {
    pub default: T,
    tracks: Vec<Option<KeyframeTrack<T>>>,
}

impl<T: Interpolatable> AnimatedValue<T> {
    /// A channel that is never animated.
    #[must_use]
    pub fn constant(default: T) -> Self {
        Self {
            default,
            tracks: Vec::new(),
        }
    }

    /// Attaches a track for one sequence, growing the table as needed.
    pub fn set_track(&mut self, sequence: usize, track: KeyframeTrack<T>) {
        if self.tracks.len() <= sequence {
            self.tracks.resize_with(sequence + 1, || None);
        }
        self.tracks[sequence] = Some(track);
    }

    /// Number of per-sequence slots in the track table (for validation).
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Evaluates the channel for the given sequence selector and time.
    #[must_use]
    pub fn sample(&self, sequence: Option<usize>, time: f32) -> T {
        let Some(sequence) = sequence else {
            return self.default;
        };

        match self.tracks.get(sequence) {
            Some(Some(track)) => track.sample(time),
            _ => self.default,
        }
    }
}
