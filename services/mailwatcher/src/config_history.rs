//! Diff links against the configuration-history companion
//!
//! When the companion is deployed it records a timestamp for every
//! configuration change it sees; the two most recent ones make a diff link
//! worth including in job notifications.

use crate::event::JobSnapshot;

/// Lookup over the history the companion recorded for a job
#[derive(Debug, Clone)]
pub struct ConfigHistory {
    installed: bool,
}

impl ConfigHistory {
    pub fn new(installed: bool) -> Self {
        Self { installed }
    }

    /// Relative URL of the diff between the job's two most recent recorded
    /// configurations
    ///
    /// `None` when the companion is not deployed or fewer than two
    /// configurations are recorded. The newer timestamp goes into
    /// `timestamp1`, matching the parameter order the companion's diff view
    /// expects.
    pub fn last_change_diff_url(&self, job: &JobSnapshot) -> Option<String> {
        if !self.installed {
            return None;
        }

        let configs = &job.stored_configs;
        if configs.len() < 2 {
            return None;
        }

        let newest = &configs[configs.len() - 1];
        let previous = &configs[configs.len() - 2];
        Some(format!(
            "{}jobConfigHistory/showDiffFiles?timestamp1={}&timestamp2={}",
            job.short_url, newest, previous
        ))
    }
}
