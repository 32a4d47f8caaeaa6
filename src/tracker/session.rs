use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::models::Session;

/// What one sampling tick observed, after the lock and idle probes have
/// been consulted in that order.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Locked,
    Idle,
    Active {
        app_name: String,
        window_title: String,
    },
}

/// State machine owning the single open session. Fed one observation per
/// tick; returns the sessions that became visible this tick (a finalized
/// predecessor, the extended open session, or both on a window switch).
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<Session>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn observe(&mut self, observation: Observation, now: DateTime<Utc>) -> Vec<Session> {
        match observation {
            Observation::Locked => {
                debug!("screen locked, pausing tracking");
                self.finalize().into_iter().collect()
            }
            Observation::Idle => {
                debug!("user idle, pausing tracking");
                self.finalize().into_iter().collect()
            }
            Observation::Active {
                app_name,
                window_title,
            } => self.advance(app_name, window_title, now),
        }
    }

    /// Force-finalizes any open session. Called on shutdown; the session
    /// keeps the end time of its last active tick.
    pub fn stop(&mut self) -> Option<Session> {
        self.finalize()
    }

    fn advance(&mut self, app_name: String, window_title: String, now: DateTime<Utc>) -> Vec<Session> {
        let mut emitted = Vec::with_capacity(2);

        let unchanged = self
            .current
            .as_ref()
            .map(|session| session.same_target(&app_name, &window_title));

        match unchanged {
            Some(true) => {
                if let Some(session) = self.current.as_mut() {
                    extend(session, now);
                    emitted.push(session.clone());
                }
            }
            Some(false) => {
                // Window changed: the old session ends exactly where the
                // new one starts, so no second is lost or counted twice.
                if let Some(mut finished) = self.current.take() {
                    finished.end_time = now;
                    info!(
                        "ended session app={} duration={}s",
                        finished.app_name, finished.duration_seconds
                    );
                    emitted.push(finished);
                }
                emitted.push(self.open(app_name, window_title, now));
            }
            None => {
                emitted.push(self.open(app_name, window_title, now));
            }
        }

        emitted
    }

    fn open(&mut self, app_name: String, window_title: String, now: DateTime<Utc>) -> Session {
        info!("started session app={} title={}", app_name, window_title);
        let mut session = Session::open(app_name, window_title, now);
        // The opening tick extends by zero seconds; counting begins with
        // the next tick, keeping duration consistent with end - start.
        extend(&mut session, now);
        let snapshot = session.clone();
        self.current = Some(session);
        snapshot
    }

    fn finalize(&mut self) -> Option<Session> {
        let finished = self.current.take()?;
        info!(
            "paused session app={} duration={}s",
            finished.app_name, finished.duration_seconds
        );
        Some(finished)
    }
}

/// Advances an open session by one tick. The increment is the whole-second
/// width of the gap since the previous tick, so scheduler jitter around the
/// nominal cadence rounds back to the expected value.
fn extend(session: &mut Session, now: DateTime<Utc>) {
    let elapsed_ms = (now - session.end_time).num_milliseconds().max(0);
    session.duration_seconds += (elapsed_ms + 500) / 1000;
    session.end_time = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn active(app: &str, title: &str) -> Observation {
        Observation::Active {
            app_name: app.to_string(),
            window_title: title.to_string(),
        }
    }

    #[test]
    fn constant_ticks_accumulate_one_second_each() {
        let mut tracker = SessionTracker::new();
        for i in 0..5 {
            tracker.observe(active("Editor", "main.rs"), at(i));
        }

        let session = tracker.current().expect("session should be open");
        assert_eq!(session.start_time, at(0));
        assert_eq!(session.end_time, at(4));
        assert_eq!(session.duration_seconds, 4);
        assert_eq!(
            session.duration_seconds,
            (session.end_time - session.start_time).num_seconds()
        );
    }

    #[test]
    fn idle_finalizes_without_advancing_end() {
        let mut tracker = SessionTracker::new();
        for i in 0..5 {
            tracker.observe(active("Editor", "main.rs"), at(i));
        }

        let emitted = tracker.observe(Observation::Idle, at(5));
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].end_time, at(4));
        assert_eq!(emitted[0].duration_seconds, 4);
        assert!(tracker.current().is_none());

        // No session reopens until an active tick arrives.
        assert!(tracker.observe(Observation::Idle, at(6)).is_empty());

        let reopened = tracker.observe(active("Browser", "docs"), at(7));
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened[0].start_time, at(7));
        assert_eq!(reopened[0].duration_seconds, 0);
    }

    #[test]
    fn lock_finalizes_open_session() {
        let mut tracker = SessionTracker::new();
        tracker.observe(active("Editor", "main.rs"), at(0));
        tracker.observe(active("Editor", "main.rs"), at(1));

        let emitted = tracker.observe(Observation::Locked, at(2));
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].duration_seconds, 1);
        assert!(tracker.current().is_none());
    }

    #[test]
    fn window_switch_closes_and_opens_at_the_same_instant() {
        let mut tracker = SessionTracker::new();
        for i in 0..3 {
            tracker.observe(active("Editor", "main.rs"), at(i));
        }

        let emitted = tracker.observe(active("Browser", "docs"), at(3));
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].app_name, "Editor");
        assert_eq!(emitted[0].end_time, at(3));
        assert_eq!(emitted[1].app_name, "Browser");
        assert_eq!(emitted[1].start_time, at(3));
        assert_eq!(emitted[0].end_time, emitted[1].start_time);
    }

    #[test]
    fn title_change_within_app_is_a_switch() {
        let mut tracker = SessionTracker::new();
        tracker.observe(active("Editor", "main.rs"), at(0));
        tracker.observe(active("Editor", "main.rs"), at(1));

        let emitted = tracker.observe(active("Editor", "lib.rs"), at(2));
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].window_title, "main.rs");
        assert_eq!(emitted[1].window_title, "lib.rs");
    }

    #[test]
    fn jitter_rounds_to_whole_seconds() {
        let mut tracker = SessionTracker::new();
        let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        tracker.observe(active("Editor", "main.rs"), start);
        tracker.observe(
            active("Editor", "main.rs"),
            start + chrono::Duration::milliseconds(1_400),
        );
        assert_eq!(tracker.current().unwrap().duration_seconds, 1);

        tracker.observe(
            active("Editor", "main.rs"),
            start + chrono::Duration::milliseconds(3_000),
        );
        assert_eq!(tracker.current().unwrap().duration_seconds, 3);
    }

    #[test]
    fn stop_returns_the_open_session() {
        let mut tracker = SessionTracker::new();
        tracker.observe(active("Editor", "main.rs"), at(0));
        tracker.observe(active("Editor", "main.rs"), at(1));

        let finished = tracker.stop().expect("open session expected");
        assert_eq!(finished.end_time, at(1));
        assert_eq!(finished.duration_seconds, 1);
        assert!(tracker.current().is_none());
        assert!(tracker.stop().is_none());
    }
}
