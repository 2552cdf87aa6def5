use std::time::{Duration, Instant};

/// Change-coalescing gate between the editing side and the compiler.
///
/// Every edit replaces any pending one and restarts the timer; only once the
/// configured quiet period elapses does [`poll`](ChangeDebouncer::poll)
/// release the newest source for compilation. Rapid keystrokes therefore
/// trigger exactly one compile.
#[derive(Debug)]
pub struct ChangeDebouncer {
    delay: Duration,
    pending: Option<PendingEdit>,
}

#[derive(Debug)]
struct PendingEdit {
    source: String,
    deadline: Instant,
}

impl ChangeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a new edit at `now`, discarding any edit still waiting.
    pub fn on_edit(&mut self, source: String, now: Instant) {
        self.pending = Some(PendingEdit {
            source,
            deadline: now + self.delay,
        });
    }

    /// Releases the pending source once its quiet period has elapsed.
    ///
    /// Returns `None` while an edit is still settling or when nothing is
    /// pending. A released edit is cleared, so each edit fires at most once.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(edit) if now >= edit.deadline => {
                self.pending.take().map(|edit| edit.source)
            }
            _ => None,
        }
    }

    /// Whether an edit is waiting out its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn single_edit_fires_after_delay() {
        let t0 = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.on_edit("a".into(), t0);

        assert_eq!(debouncer.poll(t0 + Duration::from_millis(499)), None);
        assert_eq!(debouncer.poll(t0 + DELAY), Some("a".into()));
    }

    #[test]
    fn rapid_edits_release_only_the_newest() {
        let t0 = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.on_edit("a".into(), t0);
        debouncer.on_edit("b".into(), t0 + Duration::from_millis(200));
        debouncer.on_edit("c".into(), t0 + Duration::from_millis(400));

        // The first deadline has passed but was superseded.
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.poll(t0 + Duration::from_millis(900)),
            Some("c".into())
        );
    }

    #[test]
    fn released_edit_fires_once() {
        let t0 = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.on_edit("a".into(), t0);

        assert_eq!(debouncer.poll(t0 + DELAY), Some("a".into()));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn edit_after_release_restarts_the_cycle() {
        let t0 = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.on_edit("a".into(), t0);
        assert_eq!(debouncer.poll(t0 + DELAY), Some("a".into()));

        let t1 = t0 + Duration::from_secs(2);
        debouncer.on_edit("b".into(), t1);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.poll(t1 + Duration::from_millis(100)), None);
        assert_eq!(debouncer.poll(t1 + DELAY), Some("b".into()));
    }
}
