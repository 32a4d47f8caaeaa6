use crate::models::Session;

/// Pending sessions awaiting the next flush. Successive snapshots of one
/// logical segment collapse into a single entry, so the buffer grows with
/// the number of distinct segments seen since the last drain, not with
/// tick count.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    pending: Vec<Session>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Inserts or merges a session. An existing entry for the same segment
    /// is replaced only by a snapshot that reaches at least as far, so a
    /// stale insert can never roll an entry backwards.
    pub fn push(&mut self, session: Session) {
        if let Some(entry) = self
            .pending
            .iter_mut()
            .find(|entry| same_segment(entry, &session))
        {
            if session.end_time >= entry.end_time {
                *entry = session;
            }
            return;
        }

        self.pending.push(session);
    }

    /// Captures and clears the pending set in one step.
    pub fn drain(&mut self) -> Vec<Session> {
        std::mem::take(&mut self.pending)
    }

    /// Puts a failed flush batch back. Entries buffered since the drain
    /// are newer snapshots of the same segments and win the merge.
    pub fn restore(&mut self, batch: Vec<Session>) {
        for session in batch {
            self.push(session);
        }
    }
}

/// Two sessions describe the same logical segment when they share the
/// (app, title) identity and are either snapshots from the same start or
/// contiguous extensions (previous end == next start).
fn same_segment(existing: &Session, incoming: &Session) -> bool {
    existing.same_target(&incoming.app_name, &incoming.window_title)
        && (existing.start_time == incoming.start_time
            || existing.end_time == incoming.start_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn session(app: &str, start: i64, end: i64) -> Session {
        Session {
            app_name: app.to_string(),
            window_title: "win".to_string(),
            start_time: at(start),
            end_time: at(end),
            duration_seconds: end - start,
        }
    }

    #[test]
    fn contiguous_snapshots_collapse_to_one_entry() {
        let mut buffer = SessionBuffer::new();
        buffer.push(session("Editor", 0, 0));
        buffer.push(session("Editor", 0, 1));
        buffer.push(session("Editor", 0, 2));

        assert_eq!(buffer.len(), 1);
        let drained = buffer.drain();
        assert_eq!(drained[0].end_time, at(2));
        assert_eq!(drained[0].duration_seconds, 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn distinct_segments_keep_separate_entries() {
        let mut buffer = SessionBuffer::new();
        // Same app, but the second segment starts after a gap.
        buffer.push(session("Editor", 0, 4));
        buffer.push(session("Editor", 6, 8));

        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn different_apps_never_merge() {
        let mut buffer = SessionBuffer::new();
        buffer.push(session("Editor", 0, 3));
        buffer.push(session("Browser", 3, 5));

        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn stale_snapshot_does_not_roll_back() {
        let mut buffer = SessionBuffer::new();
        buffer.push(session("Editor", 0, 5));
        buffer.push(session("Editor", 0, 3));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].end_time, at(5));
    }

    #[test]
    fn restore_keeps_the_newest_snapshot() {
        let mut buffer = SessionBuffer::new();
        buffer.push(session("Editor", 0, 10));
        let batch = buffer.drain();

        // A fresher snapshot of the same segment arrives while the flush
        // is failing, then the failed batch is restored.
        buffer.push(session("Editor", 0, 12));
        buffer.restore(batch);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.drain()[0].end_time, at(12));
    }

    #[test]
    fn restore_reinstates_unmatched_entries() {
        let mut buffer = SessionBuffer::new();
        buffer.push(session("Editor", 0, 10));
        buffer.push(session("Browser", 10, 20));
        let batch = buffer.drain();
        assert!(buffer.is_empty());

        buffer.restore(batch);
        assert_eq!(buffer.len(), 2);
    }
}
