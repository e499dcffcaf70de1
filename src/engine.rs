//! The detect/handle protocol.
//!
//! A recognizer is consulted in two phases: while detecting, its classifier
//! runs against the full history on every observation until it names a
//! gesture, which is then locked for the remainder of the run; while
//! handling, its handler runs on every observation until it finishes or
//! cancels. The log survives episode boundaries, so a single detection run
//! can legitimately span multiple touch-down/up cycles; the log is cleared
//! only when handling has finished and all contacts are up.

use log::{debug, trace};
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::event::{Observation, Timing};
use crate::history::History;

/// Suggested cadence for the host's heartbeat timer.
pub const HEARTBEAT_INTERVAL_MS: u64 = 100;

/// Verdict returned by [`GestureRecognizer::handle`] after each observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Keep handling; the handler runs again on the next observation.
    Yet,
    /// Handling is complete; the engine freezes until the episode closes,
    /// then resets.
    Finished,
    /// Drop the locked gesture and return to detecting over the same log.
    Cancel,
}

/// Externally visible protocol state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Detecting,
    Handling,
    Finished,
}

/// The two-phase gesture callbacks, as a trait so recognizers can carry
/// their own state between invocations.
pub trait GestureRecognizer {
    type Gesture: Clone;

    /// Classify the current history. Called on every observation until it
    /// returns a gesture; that gesture is then locked and this is never
    /// called again within the run.
    fn detect(&mut self, history: &History) -> Option<Self::Gesture>;

    /// Handle the locked gesture. Called on every observation while the
    /// outcome is [`HandleOutcome::Yet`].
    fn handle(&mut self, gesture: &Self::Gesture, history: &History) -> HandleOutcome;

    /// Fired exactly once per run, after [`HandleOutcome::Finished`] and
    /// before the log is reset.
    fn gesture_ended(&mut self, gesture: &Self::Gesture, history: &History) {
        let _ = (gesture, history);
    }
}

/// Closure-based [`GestureRecognizer`] for callers that do not need
/// recognizer-side state.
pub struct FnRecognizer<G, D, H> {
    detect: D,
    handle: H,
    marker: core::marker::PhantomData<G>,
}

impl<G, D, H> FnRecognizer<G, D, H>
where
    G: Clone,
    D: FnMut(&History) -> Option<G>,
    H: FnMut(&G, &History) -> HandleOutcome,
{
    pub fn new(detect: D, handle: H) -> Self {
        Self {
            detect,
            handle,
            marker: core::marker::PhantomData,
        }
    }
}

impl<G, D, H> GestureRecognizer for FnRecognizer<G, D, H>
where
    G: Clone,
    D: FnMut(&History) -> Option<G>,
    H: FnMut(&G, &History) -> HandleOutcome,
{
    type Gesture = G;

    fn detect(&mut self, history: &History) -> Option<G> {
        (self.detect)(history)
    }

    fn handle(&mut self, gesture: &G, history: &History) -> HandleOutcome {
        (self.handle)(gesture, history)
    }
}

#[derive(Clone, Copy, Debug)]
enum ProtocolEvent {
    Begin,
    Lock,
    Cancel,
    Finish,
    Reset,
}

struct ProtocolHsm;

/// Idle -> Detecting -> Handling -> Finished -> Idle, with Handling able to
/// fall back to Detecting on cancel. Events outside a state's vocabulary
/// are ignored, so the protocol cannot be driven into an illegal state.
#[state_machine(initial = "State::idle()")]
impl ProtocolHsm {
    #[state]
    fn idle(&mut self, event: &ProtocolEvent) -> Outcome<State> {
        match event {
            ProtocolEvent::Begin => Transition(State::detecting()),
            _ => Handled,
        }
    }

    #[state]
    fn detecting(&mut self, event: &ProtocolEvent) -> Outcome<State> {
        match event {
            ProtocolEvent::Lock => Transition(State::handling()),
            ProtocolEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[state]
    fn handling(&mut self, event: &ProtocolEvent) -> Outcome<State> {
        match event {
            ProtocolEvent::Cancel => Transition(State::detecting()),
            ProtocolEvent::Finish => Transition(State::finished()),
            ProtocolEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[state]
    fn finished(&mut self, event: &ProtocolEvent) -> Outcome<State> {
        match event {
            ProtocolEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }
}

/// One engine instance per logical recognizer attachment. Owns the
/// observation log exclusively; must be driven in input-delivery order.
pub struct GestureEngine<R: GestureRecognizer> {
    recognizer: R,
    history: History,
    detection: Option<R::Gesture>,
    machine: statig::blocking::StateMachine<ProtocolHsm>,
}

impl<R: GestureRecognizer> GestureEngine<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            history: History::new(),
            detection: None,
            machine: ProtocolHsm.state_machine(),
        }
    }

    /// Feed one real observation from the input source. `timing` must be
    /// `Changed` or `Ended`; heartbeats are synthesized internally.
    ///
    /// While finished, observations are dropped, except that an `Ended`
    /// observation (all contacts up) performs the full reset.
    pub fn observe(&mut self, observation: Observation) {
        debug_assert!(
            observation.timing != Timing::Heartbeat,
            "heartbeats are synthesized by the engine, not fed to it"
        );
        if self.phase() == EnginePhase::Finished {
            if observation.timing == Timing::Ended {
                self.reset();
            }
            return;
        }

        let ended = observation.timing == Timing::Ended;
        if self.history.is_empty() {
            self.machine.handle(&ProtocolEvent::Begin);
        }
        self.history.push(observation);
        self.run_cycle();

        if self.phase() == EnginePhase::Finished && ended {
            self.reset();
        }
    }

    /// Periodic tick from the host. Synthesizes a heartbeat observation
    /// repeating the last contacts, so time-threshold predicates re-evaluate
    /// without contact motion. No-op when finished, before the first
    /// observation, or after all contacts lifted.
    pub fn heartbeat(&mut self, t_ms: u64) {
        if self.phase() == EnginePhase::Finished {
            return;
        }
        let synthetic = match self.history.last() {
            Some(last) if last.timing != Timing::Ended => Observation {
                contacts: last.contacts.clone(),
                bounds: last.bounds,
                timing: Timing::Heartbeat,
                t_ms,
            },
            _ => return,
        };
        trace!("heartbeat tick at {t_ms}ms");
        self.history.push(synthetic);
        self.run_cycle();
    }

    pub fn phase(&self) -> EnginePhase {
        match self.machine.state() {
            State::Idle {} => EnginePhase::Idle,
            State::Detecting {} => EnginePhase::Detecting,
            State::Handling {} => EnginePhase::Handling,
            State::Finished {} => EnginePhase::Finished,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The locked gesture, if detection has already happened this run.
    pub fn detection(&self) -> Option<&R::Gesture> {
        self.detection.as_ref()
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn recognizer_mut(&mut self) -> &mut R {
        &mut self.recognizer
    }

    fn run_cycle(&mut self) {
        if self.detection.is_none() {
            if let Some(gesture) = self.recognizer.detect(&self.history) {
                debug!("gesture locked after {} observations", self.history.len());
                self.detection = Some(gesture);
                self.machine.handle(&ProtocolEvent::Lock);
            }
        }

        if let Some(gesture) = self.detection.clone() {
            match self.recognizer.handle(&gesture, &self.history) {
                HandleOutcome::Yet => {}
                HandleOutcome::Finished => {
                    debug!("gesture handling finished");
                    self.machine.handle(&ProtocolEvent::Finish);
                    self.recognizer.gesture_ended(&gesture, &self.history);
                }
                HandleOutcome::Cancel => {
                    debug!("gesture detection cancelled, log retained");
                    self.detection = None;
                    self.machine.handle(&ProtocolEvent::Cancel);
                }
            }
        }
    }

    fn reset(&mut self) {
        debug!("engine reset, clearing {} observations", self.history.len());
        self.history.clear();
        self.detection = None;
        self.machine.handle(&ProtocolEvent::Reset);
    }
}
