//! Human-readable markdown journal of cognition pipeline steps, for local
//! debugging. Distinct from the `activities` table, which is the source
//! of truth for audit purposes.

use crate::error::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(data_dir: &std::path::Path) -> Result<Self> {
        let journals_dir = data_dir.join("journals");
        fs::create_dir_all(&journals_dir)?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let path = journals_dir.join(format!("{today}.md"));
        if !path.exists() {
            let mut file = fs::File::create(&path)?;
            writeln!(file, "# Journal - {today}\n")?;
        }
        Ok(Self { path })
    }

    /// Record one cognition pipeline step (sentiment, agent selection,
    /// skill plan, result) with its freeform detail.
    pub fn log_step(&self, step: &str, detail: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        let timestamp = Utc::now().format("%H:%M:%S").to_string();
        writeln!(file, "### [{timestamp}] {step}\n{detail}\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_dated_file_and_appends() {
        let dir = std::env::temp_dir().join(format!("aria-journal-test-{}", uuid::Uuid::new_v4()));
        let journal = Journal::new(&dir).unwrap();
        journal.log_step("sentiment_scan", "valence=0.2 tone=neutral").unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let contents = fs::read_to_string(dir.join("journals").join(format!("{today}.md"))).unwrap();
        assert!(contents.contains("sentiment_scan"));
        let _ = fs::remove_dir_all(&dir);
    }
}
