use crate::event::{ContactId, Observation, Point, Timing, Vec2};

/// One two-contact measurement within a pinch episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchSample {
    /// Midpoint of the two contacts.
    pub center: Point,
    /// Euclidean separation of the two contacts.
    pub distance: f32,
    pub t_ms: u64,
}

/// A maximal contiguous run of observations during which exactly two
/// contacts with an unchanged identity pair are active.
#[derive(Clone, Debug)]
pub struct PinchEpisode {
    /// The identity pair, normalized so the smaller id comes first.
    pub ids: (ContactId, ContactId),
    pub samples: Vec<PinchSample>,
    /// False only while the pinch is still in progress at the end of the log.
    pub ended: bool,
}

impl PinchEpisode {
    pub fn first_distance(&self) -> f32 {
        self.samples[0].distance
    }

    /// Drift of the pinch center from the first sample to the last. Zero
    /// when fewer than two samples exist.
    pub fn center_translation(&self) -> Vec2 {
        if self.samples.len() < 2 {
            return Vec2::default();
        }
        let first = self.samples[0].center;
        let last = self.samples[self.samples.len() - 1].center;
        Vec2::new(last.x - first.x, last.y - first.y)
    }
}

/// Scan an observation run for pinch episodes.
///
/// Exactly-two-contact observations extend the open episode while the
/// identity pair matches; a pair change or a contact count other than two
/// closes it. The trailing episode is left open only when the log still ends
/// mid-pinch: last observation not `Ended`, exactly two contacts, same pair.
pub(crate) fn extract(observations: &[Observation]) -> Vec<PinchEpisode> {
    let mut episodes = Vec::new();
    let mut open: Option<PinchEpisode> = None;

    for observation in observations {
        if observation.contact_count() == 2 {
            let ids = pair_of(observation);
            match open.as_mut() {
                Some(episode) if episode.ids == ids => {
                    episode.samples.push(sample_of(observation));
                }
                _ => {
                    if let Some(mut previous) = open.take() {
                        previous.ended = true;
                        episodes.push(previous);
                    }
                    open = Some(PinchEpisode {
                        ids,
                        samples: vec![sample_of(observation)],
                        ended: false,
                    });
                }
            }
        } else if let Some(mut previous) = open.take() {
            previous.ended = true;
            episodes.push(previous);
        }
    }

    if let Some(mut trailing) = open.take() {
        trailing.ended = trailing_ended(observations.last(), trailing.ids);
        episodes.push(trailing);
    }

    episodes
}

fn trailing_ended(last: Option<&Observation>, ids: (ContactId, ContactId)) -> bool {
    let Some(last) = last else {
        return true;
    };
    if last.timing == Timing::Ended {
        return true;
    }
    if last.contact_count() != 2 {
        return true;
    }
    pair_of(last) != ids
}

fn pair_of(observation: &Observation) -> (ContactId, ContactId) {
    let a = observation.contacts[0].id;
    let b = observation.contacts[1].id;
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sample_of(observation: &Observation) -> PinchSample {
    let a = observation.contacts[0].location;
    let b = observation.contacts[1].location;
    PinchSample {
        center: a.midpoint(b),
        distance: a.distance_to(b),
        t_ms: observation.t_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Bounds, Contact, ContactPhase};

    fn two_contacts(id_a: u64, a: Point, id_b: u64, b: Point, timing: Timing, t_ms: u64) -> Observation {
        Observation {
            contacts: vec![
                Contact {
                    id: ContactId(id_a),
                    location: a,
                    phase: if timing == Timing::Ended {
                        ContactPhase::Ended
                    } else {
                        ContactPhase::Changed
                    },
                },
                Contact {
                    id: ContactId(id_b),
                    location: b,
                    phase: if timing == Timing::Ended {
                        ContactPhase::Ended
                    } else {
                        ContactPhase::Changed
                    },
                },
            ],
            bounds: Bounds::new(400.0, 400.0),
            timing,
            t_ms,
        }
    }

    fn one_contact(id: u64, location: Point, t_ms: u64) -> Observation {
        Observation {
            contacts: vec![Contact {
                id: ContactId(id),
                location,
                phase: ContactPhase::Changed,
            }],
            bounds: Bounds::new(400.0, 400.0),
            timing: Timing::Changed,
            t_ms,
        }
    }

    #[test]
    fn tracks_distance_and_center() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            two_contacts(1, Point::new(-10.0, 0.0), 2, Point::new(150.0, 0.0), Timing::Changed, 50),
        ];
        let episodes = extract(&observations);
        assert_eq!(episodes.len(), 1);
        let episode = &episodes[0];
        assert_eq!(episode.ids, (ContactId(1), ContactId(2)));
        assert_eq!(episode.samples.len(), 2);
        assert!((episode.samples[0].distance - 100.0).abs() < 1e-4);
        assert!((episode.samples[1].distance - 160.0).abs() < 1e-4);
        assert_eq!(episode.samples[0].center, Point::new(50.0, 0.0));
        // Two contacts still down, same pair: pinch is in progress.
        assert!(!episode.ended);
    }

    #[test]
    fn pair_change_closes_and_reopens() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            two_contacts(1, Point::new(0.0, 0.0), 3, Point::new(100.0, 0.0), Timing::Changed, 20),
        ];
        let episodes = extract(&observations);
        assert_eq!(episodes.len(), 2);
        assert!(episodes[0].ended);
        assert_eq!(episodes[0].ids, (ContactId(1), ContactId(2)));
        assert_eq!(episodes[1].ids, (ContactId(1), ContactId(3)));
        assert!(!episodes[1].ended);
    }

    #[test]
    fn pair_identity_ignores_report_order() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            two_contacts(2, Point::new(100.0, 0.0), 1, Point::new(0.0, 0.0), Timing::Changed, 20),
        ];
        let episodes = extract(&observations);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].samples.len(), 2);
    }

    #[test]
    fn contact_count_deviation_closes() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            one_contact(1, Point::new(0.0, 0.0), 30),
        ];
        let episodes = extract(&observations);
        assert_eq!(episodes.len(), 1);
        assert!(episodes[0].ended);
    }

    #[test]
    fn trailing_pinch_closed_by_ended_timing() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(120.0, 0.0), Timing::Ended, 40),
        ];
        let episodes = extract(&observations);
        assert_eq!(episodes.len(), 1);
        assert!(episodes[0].ended);
    }

    #[test]
    fn center_translation_tracks_drift() {
        let observations = vec![
            two_contacts(1, Point::new(0.0, 0.0), 2, Point::new(100.0, 0.0), Timing::Changed, 0),
            two_contacts(1, Point::new(20.0, 10.0), 2, Point::new(120.0, 10.0), Timing::Changed, 40),
        ];
        let episodes = extract(&observations);
        let translation = episodes[0].center_translation();
        assert!((translation.x - 20.0).abs() < 1e-4);
        assert!((translation.y - 10.0).abs() < 1e-4);
    }
}
