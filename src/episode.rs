use tracing::debug;

/// How a status message with a squawk is to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Emergency,
    Status {
        /// Inside a squawk change episode.
        mode_change: bool,
    },
}

/// Squawk change tracking of one aircraft.
#[derive(Debug, Clone, Default)]
pub struct SquawkWindow {
    last_squawk: Option<String>,
    episode_start: Option<f64>,
}

impl SquawkWindow {
    /// Classify a status message carrying `code` at time `t`.
    ///
    /// A change to a code outside `reserved` (re)opens an episode at `t`.
    /// Status messages up to `window` seconds after the opening count as
    /// mode change. Emergencies are never counted as status or mode change,
    /// but their code still becomes the last squawk.
    pub fn observe(
        &mut self,
        t: f64,
        code: &str,
        emergency: bool,
        window: f64,
        reserved: &[String],
    ) -> StatusClass {
        let class = if emergency {
            StatusClass::Emergency
        } else {
            let changed = matches!(&self.last_squawk, Some(prev) if prev != code);
            if changed && !reserved.iter().any(|r| r == code) {
                debug!("squawk change to {} at {}", code, t);
                self.episode_start = Some(t);
            }

            let mode_change = self.episode_start.is_some_and(|start| t - start <= window);
            StatusClass::Status { mode_change }
        };

        self.last_squawk = Some(code.to_string());
        class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{RESERVED_SQUAWKS, SQUAWK_CHANGE_WINDOW_SECS};

    fn reserved() -> Vec<String> {
        RESERVED_SQUAWKS.iter().map(|s| s.to_string()).collect()
    }

    /// Times classified as mode change for a run of non-emergency codes.
    fn mode_changes(seq: &[(f64, &str)]) -> (Vec<f64>, SquawkWindow) {
        let reserved = reserved();
        let mut w = SquawkWindow::default();
        let mut out = Vec::new();
        for &(t, code) in seq {
            if let StatusClass::Status { mode_change: true } =
                w.observe(t, code, false, SQUAWK_CHANGE_WINDOW_SECS, &reserved)
            {
                out.push(t);
            }
        }
        (out, w)
    }

    #[test]
    fn test_change_opens_episode() {
        let (changes, w) =
            mode_changes(&[(0.0, "1200"), (5.0, "1200"), (10.0, "1201"), (15.0, "1200")]);
        assert_eq!(changes, vec![10.0, 15.0]);
        // the return to 1200 re-opened the episode
        assert_eq!(w.episode_start, Some(15.0));
        assert_eq!(w.last_squawk.as_deref(), Some("1200"));
    }

    #[test]
    fn test_expired_episode_reopens() {
        let (changes, w) =
            mode_changes(&[(0.0, "1200"), (10.0, "1201"), (15.0, "1201"), (40.0, "1200")]);
        assert_eq!(changes, vec![10.0, 15.0, 40.0]);
        assert_eq!(w.episode_start, Some(40.0));
    }

    #[test]
    fn test_same_code_after_window() {
        let (changes, _) = mode_changes(&[
            (0.0, "1200"),
            (10.0, "1201"),
            (34.5, "1201"),
            (36.0, "1201"),
        ]);
        assert_eq!(changes, vec![10.0, 34.5]);
    }

    #[test]
    fn test_first_message_never_opens() {
        let (changes, w) = mode_changes(&[(0.0, "3611")]);
        assert!(changes.is_empty());
        assert_eq!(w.episode_start, None);
    }

    #[test]
    fn test_reserved_code_does_not_open() {
        let (changes, w) = mode_changes(&[(0.0, "1200"), (2.0, "7600"), (4.0, "7600")]);
        assert!(changes.is_empty());
        assert_eq!(w.last_squawk.as_deref(), Some("7600"));
    }

    #[test]
    fn test_emergency_short_circuits() {
        let reserved = reserved();
        let mut w = SquawkWindow::default();
        w.observe(0.0, "1200", false, SQUAWK_CHANGE_WINDOW_SECS, &reserved);
        assert_eq!(
            w.observe(1.0, "7700", true, SQUAWK_CHANGE_WINDOW_SECS, &reserved),
            StatusClass::Emergency
        );
        assert_eq!(w.episode_start, None);
        assert_eq!(w.last_squawk.as_deref(), Some("7700"));

        // 7700 is now the previous code, 1200 differs from it
        assert_eq!(
            w.observe(3.0, "1200", false, SQUAWK_CHANGE_WINDOW_SECS, &reserved),
            StatusClass::Status { mode_change: true }
        );
    }
}
