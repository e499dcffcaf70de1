//! Host-side trace replay: feed a recorded observation trace through the
//! engine and print the recognition events, optionally checking them
//! against an expected fixture.
//!
//! Trace format, one observation per line:
//!
//! ```text
//! bounds 400 400
//! 0    changed 1:50,50
//! 40   ended   1:50,50
//! ```
//!
//! Heartbeats are synthesized on the standard interval grid between trace
//! timestamps, so time-threshold gestures replay the same way they fire
//! live.

use std::{
    env,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};

use thiserror::Error;

use gesture_detect::{
    Bounds, CircleConfig, Contact, ContactId, ContactPhase, Direction, GestureEngine,
    GesturePredicate, GestureRecognizer, HandleOutcome, History, Observation, PinchConfig, Point,
    SequentialTapConfig, SlideConfig, StarConfig, SwipeConfig, TapConfig, Timing,
    HEARTBEAT_INTERVAL_MS,
};
use gesture_detect::{is_circle, is_star, DragConfig, LongPressConfig};

/// Extra heartbeat tail past the last trace sample, enough for the default
/// long-press threshold to flush on traces cut right after touch-down.
const TAIL_MS: u64 = 1200;

#[derive(Debug, Error)]
enum ReplayError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}:{line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Trace {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{0}")]
    Usage(String),
    #[error("event sequence mismatch")]
    Mismatch,
}

/// Which gesture the replay should recognize.
enum Selection {
    Predicate(GesturePredicate),
    Circle,
    Star,
}

impl Selection {
    fn parse(name: &str) -> Option<Selection> {
        let predicate = match name {
            "tap" => GesturePredicate::Tap(TapConfig::default()),
            "long-press" => GesturePredicate::LongPress(LongPressConfig::default()),
            "drag" => GesturePredicate::Drag(DragConfig::default()),
            "slide-up" => GesturePredicate::Slide(SlideConfig::new(Direction::Up)),
            "slide-down" => GesturePredicate::Slide(SlideConfig::new(Direction::Down)),
            "slide-left" => GesturePredicate::Slide(SlideConfig::new(Direction::Left)),
            "slide-right" => GesturePredicate::Slide(SlideConfig::new(Direction::Right)),
            "swipe-up" => GesturePredicate::Swipe(SwipeConfig::new(Direction::Up)),
            "swipe-down" => GesturePredicate::Swipe(SwipeConfig::new(Direction::Down)),
            "swipe-left" => GesturePredicate::Swipe(SwipeConfig::new(Direction::Left)),
            "swipe-right" => GesturePredicate::Swipe(SwipeConfig::new(Direction::Right)),
            "double-tap" => GesturePredicate::SequentialTap(SequentialTapConfig::default()),
            "pinch" => GesturePredicate::Pinch(PinchConfig::default()),
            "circle" => return Some(Selection::Circle),
            "star" => return Some(Selection::Star),
            _ => return None,
        };
        Some(Selection::Predicate(predicate))
    }
}

/// Recognizer that locks on the selected gesture, finishes when all
/// contacts lift, and records every lock/end as a timestamped event.
struct ReplayRecognizer {
    selection: Selection,
    events: Vec<(u64, &'static str)>,
}

impl ReplayRecognizer {
    fn satisfied(&self, history: &History) -> bool {
        match &self.selection {
            Selection::Predicate(predicate) => history.detected(predicate),
            Selection::Circle => any_motion_track(history, |points| {
                is_circle(points, &CircleConfig::default())
            }),
            Selection::Star => {
                any_motion_track(history, |points| is_star(points, &StarConfig::default()))
            }
        }
    }
}

fn any_motion_track(history: &History, matches: impl Fn(&[Point]) -> bool) -> bool {
    history
        .episodes()
        .iter()
        .flat_map(|episode| &episode.tracks)
        .any(|track| matches(&track.motion_locations()))
}

impl GestureRecognizer for ReplayRecognizer {
    type Gesture = ();

    fn detect(&mut self, history: &History) -> Option<()> {
        if self.satisfied(history) {
            let t_ms = history.last().map(|o| o.t_ms).unwrap_or(0);
            self.events.push((t_ms, "detected"));
            Some(())
        } else {
            None
        }
    }

    fn handle(&mut self, _gesture: &(), history: &History) -> HandleOutcome {
        if history.last().map(|o| o.timing) == Some(Timing::Ended) {
            HandleOutcome::Finished
        } else {
            HandleOutcome::Yet
        }
    }

    fn gesture_ended(&mut self, _gesture: &(), history: &History) {
        let t_ms = history.last().map(|o| o.t_ms).unwrap_or(0);
        self.events.push((t_ms, "ended"));
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ReplayError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(ReplayError::Usage(usage()));
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;
    let mut selection: Option<Selection> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--gesture" => {
                idx += 1;
                let Some(name) = args.get(idx) else {
                    return Err(ReplayError::Usage("missing name after --gesture".into()));
                };
                selection = Some(Selection::parse(name).ok_or_else(|| {
                    ReplayError::Usage(format!("unknown gesture: {name}"))
                })?);
            }
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err(ReplayError::Usage("missing path after --expect".into()));
                };
                expect_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(ReplayError::Usage(format!("unknown argument: {value}")));
            }
            value => {
                if trace_path.is_some() {
                    return Err(ReplayError::Usage("multiple trace paths provided".into()));
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(|| ReplayError::Usage(usage()))?;
    let selection = selection.ok_or_else(|| ReplayError::Usage(usage()))?;
    let observations = parse_trace(&trace_path)?;

    let mut engine = GestureEngine::new(ReplayRecognizer {
        selection,
        events: Vec::new(),
    });

    let mut clock_ms: Option<u64> = None;
    for observation in observations {
        // Synthetic heartbeats on the interval grid up to this observation.
        if let Some(previous) = clock_ms {
            let mut tick = next_tick(previous);
            while tick < observation.t_ms {
                engine.heartbeat(tick);
                tick += HEARTBEAT_INTERVAL_MS;
            }
        }
        clock_ms = Some(observation.t_ms);
        engine.observe(observation);
    }

    // Traces often stop at the last physical sample; keep ticking so hold
    // gestures still in flight can fire. Inert once contacts are up.
    if let Some(last_ms) = clock_ms {
        let mut tick = next_tick(last_ms);
        while tick <= last_ms + TAIL_MS {
            engine.heartbeat(tick);
            tick += HEARTBEAT_INTERVAL_MS;
        }
    }

    println!("event,ms,kind");
    for (t_ms, kind) in &engine.recognizer().events {
        println!("event,{t_ms},{kind}");
    }

    if let Some(expect_path) = expect_path {
        let expected = parse_expected_kinds(&expect_path)?;
        let actual: Vec<&'static str> = engine
            .recognizer()
            .events
            .iter()
            .map(|(_, kind)| *kind)
            .collect();
        if actual != expected {
            eprintln!("expected kinds: {}", expected.join(","));
            eprintln!("actual kinds:   {}", actual.join(","));
            return Err(ReplayError::Mismatch);
        }
    }

    Ok(())
}

fn next_tick(after_ms: u64) -> u64 {
    (after_ms / HEARTBEAT_INTERVAL_MS + 1) * HEARTBEAT_INTERVAL_MS
}

fn usage() -> String {
    "usage: gesture_replay <trace.txt> --gesture <name> [--expect expected_kinds.txt]\n\
     gestures: tap long-press drag slide-{up,down,left,right} \
     swipe-{up,down,left,right} double-tap pinch circle star"
        .to_string()
}

fn parse_trace(path: &Path) -> Result<Vec<Observation>, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut bounds = Bounds {
        width: 400.0,
        height: 400.0,
    };
    let mut out: Vec<Observation> = Vec::new();

    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result.map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let first = fields.next().unwrap_or_default();

        if first == "bounds" {
            let width = parse_f32(fields.next(), path, line_no, "bounds width")?;
            let height = parse_f32(fields.next(), path, line_no, "bounds height")?;
            bounds = Bounds { width, height };
            continue;
        }

        let t_ms = parse_u64(Some(first), path, line_no, "ms")?;
        let timing = match fields.next() {
            Some("changed") => Timing::Changed,
            Some("ended") => Timing::Ended,
            other => {
                return Err(trace_error(
                    path,
                    line_no,
                    format!("expected changed|ended, got '{}'", other.unwrap_or("")),
                ))
            }
        };
        let phase = match timing {
            Timing::Ended => ContactPhase::Ended,
            _ => ContactPhase::Changed,
        };

        let mut contacts = Vec::new();
        for token in fields {
            contacts.push(parse_contact(token, phase, path, line_no)?);
        }
        if let Some(previous) = out.last() {
            if t_ms < previous.t_ms {
                return Err(trace_error(
                    path,
                    line_no,
                    format!("timestamp {t_ms} before previous {}", previous.t_ms),
                ));
            }
        }

        out.push(Observation {
            contacts,
            bounds,
            timing,
            t_ms,
        });
    }

    Ok(out)
}

/// One contact token: `id:x,y`.
fn parse_contact(
    token: &str,
    phase: ContactPhase,
    path: &Path,
    line_no: usize,
) -> Result<Contact, ReplayError> {
    let invalid = || trace_error(path, line_no, format!("invalid contact '{token}'"));

    let (id, location) = token.split_once(':').ok_or_else(&invalid)?;
    let (x, y) = location.split_once(',').ok_or_else(&invalid)?;
    Ok(Contact {
        id: ContactId(id.trim().parse::<u64>().map_err(|_| invalid())?),
        location: Point::new(
            x.trim().parse::<f32>().map_err(|_| invalid())?,
            y.trim().parse::<f32>().map_err(|_| invalid())?,
        ),
        phase,
    })
}

fn parse_expected_kinds(path: &Path) -> Result<Vec<&'static str>, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut kinds = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result.map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            line: line_no,
            source,
        })?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        kinds.push(match token {
            "detected" => "detected",
            "ended" => "ended",
            _ => {
                return Err(trace_error(
                    path,
                    line_no,
                    format!("invalid expected event kind: {token}"),
                ))
            }
        });
    }

    Ok(kinds)
}

fn trace_error(path: &Path, line: usize, message: String) -> ReplayError {
    ReplayError::Trace {
        path: path.to_path_buf(),
        line,
        message,
    }
}

fn parse_u64(
    raw: Option<&str>,
    path: &Path,
    line_no: usize,
    field: &str,
) -> Result<u64, ReplayError> {
    let raw = raw.unwrap_or_default().trim();
    raw.parse::<u64>()
        .map_err(|e| trace_error(path, line_no, format!("invalid {field} '{raw}': {e}")))
}

fn parse_f32(
    raw: Option<&str>,
    path: &Path,
    line_no: usize,
    field: &str,
) -> Result<f32, ReplayError> {
    let raw = raw.unwrap_or_default().trim();
    raw.parse::<f32>()
        .map_err(|e| trace_error(path, line_no, format!("invalid {field} '{raw}': {e}")))
}
