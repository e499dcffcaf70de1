use crate::event::{Bounds, ContactId, ContactPhase, Observation, Point, Timing, Vec2};
use crate::pinch::{self, PinchEpisode};

/// One per-contact sample inside an episode, carrying the index of the
/// observation it was flattened from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSample {
    pub location: Point,
    pub phase: ContactPhase,
    pub timing: Timing,
    pub bounds: Bounds,
    pub t_ms: u64,
    pub observation: usize,
}

/// The ordered samples of one contact within one episode. Never empty.
#[derive(Clone, Debug)]
pub struct ContactTrack {
    pub id: ContactId,
    pub samples: Vec<TrackSample>,
}

impl ContactTrack {
    pub fn first(&self) -> &TrackSample {
        &self.samples[0]
    }

    pub fn last(&self) -> &TrackSample {
        &self.samples[self.samples.len() - 1]
    }

    /// Active time window, first sample to last sample.
    pub fn period(&self) -> (u64, u64) {
        (self.first().t_ms, self.last().t_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.last().t_ms.saturating_sub(self.first().t_ms)
    }

    /// Whether the contact has been lifted.
    pub fn ended(&self) -> bool {
        self.last().phase == ContactPhase::Ended
    }

    /// Whether the final sample lies within the bounds recorded with it.
    pub fn ends_in_bounds(&self) -> bool {
        let last = self.last();
        last.bounds.contains(last.location)
    }

    /// Displacement from the first sample to the last.
    pub fn displacement(&self) -> Vec2 {
        let first = self.first().location;
        let last = self.last().location;
        Vec2::new(last.x - first.x, last.y - first.y)
    }

    /// Instantaneous velocity in px/sec over the last two samples. Zero when
    /// fewer than two samples exist or their time delta is zero.
    pub fn velocity(&self) -> Vec2 {
        if self.samples.len() < 2 {
            return Vec2::default();
        }
        let last = self.last();
        let previous = &self.samples[self.samples.len() - 2];
        let dt_ms = last.t_ms.saturating_sub(previous.t_ms);
        if dt_ms == 0 {
            return Vec2::default();
        }
        let scale = 1000.0 / dt_ms as f32;
        Vec2::new(
            (last.location.x - previous.location.x) * scale,
            (last.location.y - previous.location.y) * scale,
        )
    }

    /// Whether two tracks' active windows intersect, strict on both ends so
    /// merely touching endpoints do not count.
    pub fn overlaps(&self, other: &ContactTrack) -> bool {
        let (start_a, end_a) = self.period();
        let (start_b, end_b) = other.period();
        start_a.max(start_b) < end_a.min(end_b)
    }

    /// Whether this track overlaps any other track in the slice. Tracks with
    /// the same contact id are skipped, so a track never excludes itself.
    pub fn overlaps_any(&self, others: &[ContactTrack]) -> bool {
        others
            .iter()
            .filter(|other| other.id != self.id)
            .any(|other| other.overlaps(self))
    }

    pub fn locations(&self) -> Vec<Point> {
        self.samples.iter().map(|sample| sample.location).collect()
    }

    /// Locations from input-source samples only, with heartbeat repeats
    /// filtered out. This is the point sequence the shape classifier expects.
    pub fn motion_locations(&self) -> Vec<Point> {
        self.samples
            .iter()
            .filter(|sample| sample.timing.is_raw())
            .map(|sample| sample.location)
            .collect()
    }
}

/// A maximal contiguous run of observations bounded by all contacts lifting:
/// the log is split after every `Ended` observation, and a trailing run
/// without one stays open.
#[derive(Clone, Debug)]
pub struct Episode {
    /// Index of the first observation in the run, inclusive.
    pub start: usize,
    /// Index of the last observation in the run, inclusive.
    pub end: usize,
    /// Per-contact tracks, ordered by each track's first sample time.
    pub tracks: Vec<ContactTrack>,
}

impl Episode {
    pub fn last_observation(&self) -> usize {
        self.end
    }
}

/// The append-only observation log and the derived views over it.
///
/// Episodes, tracks, and pinch episodes are recomputed from the log on
/// demand; they are views, not independently mutable state. Expected event
/// volumes are tens to low hundreds of samples per gesture, so recomputation
/// is the intended strategy.
#[derive(Clone, Debug, Default)]
pub struct History {
    observations: Vec<Observation>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub(crate) fn clear(&mut self) {
        self.observations.clear();
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Segment the log into episodes. Episodes partition the log: every
    /// observation index lands in exactly one episode, in order.
    pub fn episodes(&self) -> Vec<Episode> {
        let mut episodes = Vec::new();
        let mut start = 0;
        for index in 0..self.observations.len() {
            if self.observations[index].timing == Timing::Ended {
                episodes.push(self.build_episode(start, index));
                start = index + 1;
            } else if index + 1 == self.observations.len() {
                episodes.push(self.build_episode(start, index));
            }
        }
        episodes
    }

    pub fn latest_episode(&self) -> Option<Episode> {
        self.episodes().pop()
    }

    pub fn pinch_episodes(&self) -> Vec<PinchEpisode> {
        pinch::extract(&self.observations)
    }

    fn build_episode(&self, start: usize, end: usize) -> Episode {
        // Flatten per-contact samples, stable-sort by time, then group by
        // contact id. Iterating time-sorted samples and appending groups in
        // first-seen order yields tracks ordered by first sample time with a
        // stable tie-break.
        let mut flat: Vec<(ContactId, TrackSample)> = Vec::new();
        for index in start..=end {
            let observation = &self.observations[index];
            for contact in &observation.contacts {
                flat.push((
                    contact.id,
                    TrackSample {
                        location: contact.location,
                        phase: contact.phase,
                        timing: observation.timing,
                        bounds: observation.bounds,
                        t_ms: observation.t_ms,
                        observation: index,
                    },
                ));
            }
        }
        flat.sort_by_key(|(_, sample)| sample.t_ms);

        let mut tracks: Vec<ContactTrack> = Vec::new();
        for (id, sample) in flat {
            match tracks.iter_mut().find(|track| track.id == id) {
                Some(track) => track.samples.push(sample),
                None => tracks.push(ContactTrack {
                    id,
                    samples: vec![sample],
                }),
            }
        }

        Episode { start, end, tracks }
    }
}
