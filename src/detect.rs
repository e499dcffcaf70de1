//! The default-gesture predicate library.
//!
//! Every predicate answers "has this gesture already been satisfied by the
//! log?". With `restrict_to_latest_episode` off, predicates are monotone:
//! once true for a log prefix they stay true for any superset log, so
//! callers never need to re-derive state they already acted on.

use crate::event::Vec2;
use crate::history::{ContactTrack, Episode, History};
use crate::pinch;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

/// Axis and sign for slide/swipe detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Component of `v` along this direction; up and left negate the axis.
    pub fn signed_component(self, v: Vec2) -> f32 {
        match self {
            Direction::Up => -v.y,
            Direction::Down => v.y,
            Direction::Left => -v.x,
            Direction::Right => v.x,
        }
    }
}

/// Tap: a non-overlapping track that ended inside the view bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TapConfig {
    /// Skip the overlap-exclusion check, so simultaneous contacts may
    /// satisfy the predicate.
    pub allow_multi_contact: bool,
    /// Evaluate only the most recent episode instead of the whole history.
    pub restrict_to_latest_episode: bool,
}

/// Long press: a non-overlapping track held at least `min_duration_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LongPressConfig {
    /// Hold duration threshold. Defaults to 1000 ms.
    pub min_duration_ms: u64,
    pub allow_multi_contact: bool,
    pub restrict_to_latest_episode: bool,
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 1000,
            allow_multi_contact: false,
            restrict_to_latest_episode: false,
        }
    }
}

/// Drag: first-to-last displacement of at least `min_distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DragConfig {
    /// Displacement threshold in px. Defaults to 10.
    pub min_distance: f32,
    pub allow_multi_contact: bool,
    pub restrict_to_latest_episode: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_distance: 10.0,
            allow_multi_contact: false,
            restrict_to_latest_episode: false,
        }
    }
}

/// Slide: signed displacement along one axis of at least `min_distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlideConfig {
    pub direction: Direction,
    /// Signed displacement threshold in px. Defaults to 10.
    pub min_distance: f32,
    pub allow_multi_contact: bool,
    pub restrict_to_latest_episode: bool,
}

impl SlideConfig {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            min_distance: 10.0,
            allow_multi_contact: false,
            restrict_to_latest_episode: false,
        }
    }
}

/// Swipe: a released track whose instantaneous velocity along one axis
/// reaches `min_velocity`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwipeConfig {
    pub direction: Direction,
    /// Velocity threshold in px/sec. Defaults to 300.
    pub min_velocity: f32,
    pub allow_multi_contact: bool,
    pub restrict_to_latest_episode: bool,
}

impl SwipeConfig {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            min_velocity: 300.0,
            allow_multi_contact: false,
            restrict_to_latest_episode: false,
        }
    }
}

/// Sequential tap: `count` qualifying taps with at most `max_interval_ms`
/// between consecutive tap end times.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequentialTapConfig {
    /// Number of consecutive taps required. Defaults to 2.
    pub count: usize,
    /// Maximum gap between consecutive tap ends. Defaults to 250 ms.
    pub max_interval_ms: u64,
    /// Require the run to be completed by the chronologically last
    /// qualifying tap, rather than truncating the candidate list.
    pub restrict_to_latest_episode: bool,
}

impl Default for SequentialTapConfig {
    fn default() -> Self {
        Self {
            count: 2,
            max_interval_ms: 250,
            restrict_to_latest_episode: false,
        }
    }
}

/// Pinch: some pinch episode whose two-contact distance deviates from its
/// first sample by at least `min_distance_change`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinchConfig {
    /// Distance-change threshold in px. Defaults to 50.
    pub min_distance_change: f32,
    pub restrict_to_latest_episode: bool,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            min_distance_change: 50.0,
            restrict_to_latest_episode: false,
        }
    }
}

/// A configured default gesture to test the history against.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GesturePredicate {
    Tap(TapConfig),
    LongPress(LongPressConfig),
    Drag(DragConfig),
    Slide(SlideConfig),
    Swipe(SwipeConfig),
    SequentialTap(SequentialTapConfig),
    Pinch(PinchConfig),
}

impl History {
    /// Whether the configured gesture has already been satisfied by the log.
    pub fn detected(&self, predicate: &GesturePredicate) -> bool {
        match predicate {
            GesturePredicate::Tap(config) => self.detect_tap(config),
            GesturePredicate::LongPress(config) => self.detect_long_press(config),
            GesturePredicate::Drag(config) => self.detect_drag(config),
            GesturePredicate::Slide(config) => self.detect_slide(config),
            GesturePredicate::Swipe(config) => self.detect_swipe(config),
            GesturePredicate::SequentialTap(config) => self.detect_sequential_tap(config),
            GesturePredicate::Pinch(config) => self.detect_pinch(config),
        }
    }

    fn detect_tap(&self, config: &TapConfig) -> bool {
        any_track(
            &self.candidate_episodes(config.restrict_to_latest_episode),
            config.allow_multi_contact,
            |track| track.ended() && track.ends_in_bounds(),
        )
    }

    fn detect_long_press(&self, config: &LongPressConfig) -> bool {
        any_track(
            &self.candidate_episodes(config.restrict_to_latest_episode),
            config.allow_multi_contact,
            |track| track.duration_ms() >= config.min_duration_ms,
        )
    }

    fn detect_drag(&self, config: &DragConfig) -> bool {
        any_track(
            &self.candidate_episodes(config.restrict_to_latest_episode),
            config.allow_multi_contact,
            |track| track.displacement().length() >= config.min_distance,
        )
    }

    fn detect_slide(&self, config: &SlideConfig) -> bool {
        any_track(
            &self.candidate_episodes(config.restrict_to_latest_episode),
            config.allow_multi_contact,
            |track| config.direction.signed_component(track.displacement()) >= config.min_distance,
        )
    }

    fn detect_swipe(&self, config: &SwipeConfig) -> bool {
        any_track(
            &self.candidate_episodes(config.restrict_to_latest_episode),
            config.allow_multi_contact,
            |track| {
                track.ended()
                    && config.direction.signed_component(track.velocity()) >= config.min_velocity
            },
        )
    }

    fn detect_sequential_tap(&self, config: &SequentialTapConfig) -> bool {
        if config.count == 0 {
            return false;
        }

        // Qualifying tap ends in chronological order across all episodes:
        // released, inside bounds, not overlapping another track.
        let episodes = self.episodes();
        let mut tap_ends: Vec<u64> = Vec::new();
        for episode in &episodes {
            for track in &episode.tracks {
                if track.ended() && track.ends_in_bounds() && !track.overlaps_any(&episode.tracks) {
                    tap_ends.push(track.last().t_ms);
                }
            }
        }
        if tap_ends.len() < config.count {
            return false;
        }

        let mut run = 0usize;
        let mut previous: Option<u64> = None;
        for (index, &end_ms) in tap_ends.iter().enumerate() {
            run = match previous {
                Some(previous_ms) if end_ms.saturating_sub(previous_ms) <= config.max_interval_ms => {
                    run + 1
                }
                _ => 1,
            };
            previous = Some(end_ms);
            if run >= config.count
                && (!config.restrict_to_latest_episode || index + 1 == tap_ends.len())
            {
                return true;
            }
        }
        false
    }

    fn detect_pinch(&self, config: &PinchConfig) -> bool {
        let pinches = if config.restrict_to_latest_episode {
            match self.latest_episode() {
                Some(episode) => {
                    pinch::extract(&self.observations()[episode.start..=episode.end])
                }
                None => return false,
            }
        } else {
            self.pinch_episodes()
        };

        pinches.iter().any(|episode| {
            let initial = episode.first_distance();
            episode
                .samples
                .iter()
                .any(|sample| (sample.distance - initial).abs() >= config.min_distance_change)
        })
    }

    fn candidate_episodes(&self, restrict_to_latest: bool) -> Vec<Episode> {
        if restrict_to_latest {
            self.latest_episode().into_iter().collect()
        } else {
            self.episodes()
        }
    }
}

fn any_track(
    episodes: &[Episode],
    allow_multi_contact: bool,
    satisfied: impl Fn(&ContactTrack) -> bool,
) -> bool {
    episodes.iter().any(|episode| {
        episode.tracks.iter().any(|track| {
            (allow_multi_contact || !track.overlaps_any(&episode.tracks)) && satisfied(track)
        })
    })
}
