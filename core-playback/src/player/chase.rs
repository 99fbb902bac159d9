//! Seek coalescing.
//!
//! A slider can request many seeks per second while the pipeline can only
//! work on one. `SeekChaser` keeps a single chase target: the first request
//! of a burst issues a real seek, later requests only move the target, and
//! every finished seek either settles (target unchanged) or immediately
//! chases the latest target. Targets compare by exact equality.
//!
//! The chaser is pure bookkeeping; the controller performs the pause, the
//! seek calls and the resume it asks for. `C` is the completion the caller of
//! the first seek in a burst is waiting on.

use std::time::Duration;

/// What the controller must do with a new seek request.
#[derive(Debug)]
pub enum SeekDecision<C> {
    /// The target equals the current chase target; complete the caller now.
    Unchanged(C),
    /// A burst starts: pause, then issue a real seek for `target`.
    Start { target: Duration, generation: u64 },
    /// A seek is already in flight and will chase the new target; complete
    /// the caller now.
    Retargeted(C),
}

/// What the controller must do when a real seek finishes.
#[derive(Debug)]
pub enum SeekOutcome<C> {
    /// The seek belongs to a burst that was reset; ignore it.
    Stale,
    /// The target moved while the seek was in flight; seek again.
    Reissue { target: Duration, generation: u64 },
    /// The pipeline reached the latest target.
    Settled {
        target: Duration,
        /// Playback was active before the burst started.
        resume: bool,
        completion: Option<C>,
    },
}

#[derive(Debug)]
pub struct SeekChaser<C> {
    target: Option<Duration>,
    in_flight: bool,
    resume_after: bool,
    generation: u64,
    completion: Option<C>,
}

impl<C> Default for SeekChaser<C> {
    fn default() -> Self {
        Self {
            target: None,
            in_flight: false,
            resume_after: false,
            generation: 0,
            completion: None,
        }
    }
}

impl<C> SeekChaser<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently requested position.
    pub fn target(&self) -> Option<Duration> {
        self.target
    }

    /// A real seek has been issued and has not finished.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn request(&mut self, target: Duration, was_playing: bool, completion: C) -> SeekDecision<C> {
        if self.target == Some(target) {
            return SeekDecision::Unchanged(completion);
        }

        self.target = Some(target);

        if self.in_flight {
            return SeekDecision::Retargeted(completion);
        }

        self.in_flight = true;
        self.resume_after = was_playing;
        self.completion = Some(completion);
        SeekDecision::Start {
            target,
            generation: self.generation,
        }
    }

    /// A real seek issued for `issued_for` in burst `generation` finished.
    pub fn on_seek_finished(&mut self, issued_for: Duration, generation: u64) -> SeekOutcome<C> {
        if generation != self.generation || !self.in_flight {
            return SeekOutcome::Stale;
        }

        match self.target {
            Some(target) if target != issued_for => SeekOutcome::Reissue {
                target,
                generation: self.generation,
            },
            _ => {
                self.in_flight = false;
                SeekOutcome::Settled {
                    target: issued_for,
                    resume: std::mem::take(&mut self.resume_after),
                    completion: self.completion.take(),
                }
            }
        }
    }

    /// Forget the current burst. Seeks already issued finish as `Stale`.
    ///
    /// Returns the completion of an unfinished burst.
    pub fn reset(&mut self) -> Option<C> {
        self.generation = self.generation.wrapping_add(1);
        self.target = None;
        self.in_flight = false;
        self.resume_after = false;
        self.completion.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn test_single_seek_settles_and_resumes() {
        let mut chaser = SeekChaser::new();

        let SeekDecision::Start { target, generation } = chaser.request(secs(5.0), true, "first")
        else {
            panic!("expected a real seek");
        };
        assert_eq!(target, secs(5.0));
        assert!(chaser.in_flight());

        match chaser.on_seek_finished(target, generation) {
            SeekOutcome::Settled {
                resume, completion, ..
            } => {
                assert!(resume);
                assert_eq!(completion, Some("first"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!chaser.in_flight());
        assert_eq!(chaser.target(), Some(secs(5.0)));
    }

    #[test]
    fn test_duplicate_target_is_a_no_op() {
        let mut chaser = SeekChaser::new();
        assert!(matches!(
            chaser.request(secs(5.0), false, 1),
            SeekDecision::Start { .. }
        ));
        assert!(matches!(
            chaser.request(secs(5.0), false, 2),
            SeekDecision::Unchanged(2)
        ));
    }

    #[test]
    fn test_burst_converges_to_last_target_with_one_reissue() {
        let mut chaser = SeekChaser::new();
        let SeekDecision::Start { target, generation } = chaser.request(secs(1.0), true, 0) else {
            panic!("expected a real seek");
        };

        for (i, t) in [2.0, 3.0, 4.0].iter().enumerate() {
            assert!(matches!(
                chaser.request(secs(*t), false, i + 1),
                SeekDecision::Retargeted(_)
            ));
        }

        let SeekOutcome::Reissue {
            target: next,
            generation,
        } = chaser.on_seek_finished(target, generation)
        else {
            panic!("expected a re-issued seek");
        };
        assert_eq!(next, secs(4.0));

        match chaser.on_seek_finished(next, generation) {
            SeekOutcome::Settled {
                resume, completion, ..
            } => {
                // Resume decision comes from the start of the burst
                assert!(resume);
                assert_eq!(completion, Some(0));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_exact_equality_distinguishes_nanoseconds() {
        let mut chaser = SeekChaser::new();
        chaser.request(Duration::from_nanos(5_000_000_000), false, ());
        assert!(matches!(
            chaser.request(Duration::from_nanos(5_000_000_001), false, ()),
            SeekDecision::Retargeted(())
        ));
    }

    #[test]
    fn test_reset_makes_inflight_seek_stale() {
        let mut chaser = SeekChaser::new();
        let SeekDecision::Start { target, generation } = chaser.request(secs(3.0), true, "x")
        else {
            panic!("expected a real seek");
        };

        assert_eq!(chaser.reset(), Some("x"));
        assert!(matches!(
            chaser.on_seek_finished(target, generation),
            SeekOutcome::Stale
        ));

        // Next burst starts fresh, even for the same position
        assert!(matches!(
            chaser.request(secs(3.0), false, "y"),
            SeekDecision::Start { .. }
        ));
    }
}
