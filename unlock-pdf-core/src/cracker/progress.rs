//! Transient progress lines on stderr.
//!
//! Updates are CR-terminated so they overwrite in place; the final status
//! goes to stdout elsewhere. Cadence is decided by the caller (every 100
//! candidates for streamed sources, every 1000 for brute force).

use std::io::Write as _;

pub(crate) struct Progress {
    /// Total candidates, 0 when unknown
    total: usize,
}

impl Progress {
    pub(crate) fn new(total: usize) -> Self {
        Self { total }
    }

    pub(crate) fn emit(&self, tried: usize) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", self.format_line(tried));
        let _ = stderr.flush();
    }

    /// Terminate the transient line once the search ends.
    pub(crate) fn finish(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr);
    }

    fn format_line(&self, tried: usize) -> String {
        if self.total == 0 {
            format!("Passwords tried: {tried}")
        } else {
            let percent = tried as f64 / self.total as f64 * 100.0;
            format!(
                "Trying passwords... {percent:.2}% ({tried}/{})",
                self.total
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_without_total() {
        let progress = Progress::new(0);
        assert_eq!(progress.format_line(1500), "Passwords tried: 1500");
    }

    #[test]
    fn test_format_with_total() {
        let progress = Progress::new(200);
        assert_eq!(
            progress.format_line(50),
            "Trying passwords... 25.00% (50/200)"
        );
    }
}
