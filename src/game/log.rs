//! The ground-truth game log.
//!
//! Two streams come out of a hand: the *audit* stream, an unfiltered
//! record of every deck state and reveal (fed to an external file sink,
//! line by line, in order), and the *broadcast* stream, the short
//! player-facing chat lines mirrored to the room. Both are held here in
//! order; actually writing them anywhere is the transport's job.

use chrono::{DateTime, Utc};

/// Ordered, timestamped log lines for one hand.
#[derive(Debug)]
pub struct GameLog {
    started_at: DateTime<Utc>,
    audit_lines: Vec<String>,
    broadcast_lines: Vec<String>,
}

impl Default for GameLog {
    fn default() -> Self {
        Self::new()
    }
}

impl GameLog {
    #[must_use]
    pub fn new() -> Self {
        let started_at = Utc::now();
        let mut log = Self {
            started_at,
            audit_lines: Vec::new(),
            broadcast_lines: Vec::new(),
        };
        log.audit_raw("--- MENTAL POKER GAME LOG ---".to_string());
        log.audit_raw(format!(
            "Game Start: {}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        log
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_secs(&self) -> f64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds() as f64 / 1000.0
    }

    /// Append a timestamped audit line, returning it so the caller can
    /// forward it to the sink.
    pub fn audit(&mut self, message: impl AsRef<str>) -> String {
        let line = format!("[{}] {}", Utc::now().format("%H:%M:%S"), message.as_ref());
        self.audit_lines.push(line.clone());
        line
    }

    /// Append an un-timestamped audit line (section headers, summaries).
    pub fn audit_raw(&mut self, line: String) -> String {
        self.audit_lines.push(line.clone());
        line
    }

    /// Append a player-facing chat line, returning it for broadcast.
    pub fn broadcast(&mut self, actor: &str, message: &str) -> String {
        let line = format!("{} - {actor}: {message}", Utc::now().format("%H:%M:%S"));
        self.broadcast_lines.push(line.clone());
        line
    }

    #[must_use]
    pub fn audit_lines(&self) -> &[String] {
        &self.audit_lines
    }

    #[must_use]
    pub fn broadcast_lines(&self) -> &[String] {
        &self.broadcast_lines
    }
}
