//! Real-time multi-contact gesture detection.
//!
//! The engine consumes an ordered stream of touch observations and decides,
//! contact by contact and episode by episode, whether a configured gesture
//! has occurred. It is pure computation over an in-memory log: no I/O, no
//! threads, no UI-toolkit types. The host feeds it platform pointer events
//! plus periodic heartbeat ticks, and supplies the detect/handle callbacks.
//!
//! - [`event`]: raw value types fed in by the input source.
//! - [`history`]: the observation log and its episode/track views.
//! - [`detect`]: the default-gesture predicate library.
//! - [`pinch`]: two-contact pinch episode extraction.
//! - [`shape`]: turning-angle trajectory classification (circle, star).
//! - [`engine`]: the detect-once/handle-repeatedly protocol state machine.

pub mod detect;
pub mod engine;
pub mod event;
pub mod history;
pub mod pinch;
pub mod shape;

pub use detect::{
    Direction, DragConfig, GesturePredicate, LongPressConfig, PinchConfig, SequentialTapConfig,
    SlideConfig, SwipeConfig, TapConfig,
};
pub use engine::{
    EnginePhase, FnRecognizer, GestureEngine, GestureRecognizer, HandleOutcome,
    HEARTBEAT_INTERVAL_MS,
};
pub use event::{Bounds, Contact, ContactId, ContactPhase, Observation, Point, Timing, Vec2};
pub use history::{ContactTrack, Episode, History, TrackSample};
pub use pinch::{PinchEpisode, PinchSample};
pub use shape::{is_circle, is_star, CircleConfig, StarConfig};
