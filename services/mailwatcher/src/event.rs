//! Lifecycle event payloads and the resource snapshots they carry
//!
//! The event source delivers one JSON object per occurrence. Snapshots
//! include the per-resource watcher configuration, so dispatch never has to
//! reach back into the controller.

use serde::{Deserialize, Serialize};

/// Actor attributed to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    #[serde(default)]
    pub mail_address: Option<String>,
}

impl UserRef {
    /// Sentinel used when no actor can be attributed
    pub fn unknown() -> Self {
        Self {
            id: "unknown".to_string(),
            mail_address: None,
        }
    }
}

/// Why a computer was taken offline, optionally naming who did it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineCause {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Watcher address lists configured on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAddresses {
    pub online_addresses: String,
    pub offline_addresses: String,
}

/// A job as seen at the moment the event fired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Full display name
    pub name: String,
    pub short_url: String,
    /// Short URLs of enclosing item groups, innermost first
    #[serde(default)]
    pub parents: Vec<String>,
    /// Watcher address list property; absent when unconfigured
    #[serde(default)]
    pub watcher_addresses: Option<String>,
    /// Configuration timestamps recorded by the history companion, oldest
    /// first; empty when the companion never saw this job
    #[serde(default)]
    pub stored_configs: Vec<String>,
}

impl JobSnapshot {
    /// Path from the instance root, outermost group first
    pub fn full_url(&self) -> String {
        let mut url = String::new();
        for parent in self.parents.iter().rev() {
            url.push_str(parent);
        }
        url.push_str(&self.short_url);
        url
    }
}

/// An item in the build tree; only jobs are watched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Job(JobSnapshot),
    Other { name: String },
}

impl Item {
    pub fn as_job(&self) -> Option<&JobSnapshot> {
        match self {
            Item::Job(job) => Some(job),
            Item::Other { .. } => None,
        }
    }
}

/// One executor slot on a computer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSnapshot {
    pub idle: bool,
    /// Run currently occupying the slot, when not idle
    #[serde(default)]
    pub run_id: Option<String>,
}

/// A computer as seen at the moment the event fired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputerSnapshot {
    pub display_name: String,
    pub url: String,
    /// Watcher address lists configured on the node; absent when
    /// unconfigured
    #[serde(default)]
    pub property: Option<NodeAddresses>,
    #[serde(default)]
    pub temporarily_offline: bool,
    #[serde(default)]
    pub offline_cause: Option<OfflineCause>,
    #[serde(default)]
    pub executors: Vec<ExecutorSnapshot>,
    #[serde(default)]
    pub one_off_executors: Vec<ExecutorSnapshot>,
}

/// A finished run, pointing at the computer it was built on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub id: String,
    pub display_name: String,
    /// Absent when the event source could not identify the computer
    #[serde(default)]
    pub computer: Option<ComputerSnapshot>,
}

/// A lifecycle occurrence delivered by the event source
///
/// Every variant may carry the user the event source attributes the action
/// to; dispatch falls back to [`UserRef::unknown`] when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    JobRenamed {
        item: Item,
        old_name: String,
        new_name: String,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    JobUpdated {
        item: Item,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    JobDeleted {
        item: Item,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    ComputerOnline {
        computer: ComputerSnapshot,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    ComputerOffline {
        computer: ComputerSnapshot,
        #[serde(default)]
        cause: Option<OfflineCause>,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    ComputerTemporarilyOffline {
        computer: ComputerSnapshot,
        #[serde(default)]
        cause: Option<OfflineCause>,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    ComputerTemporarilyOnline {
        computer: ComputerSnapshot,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
    RunFinalized {
        run: RunSnapshot,
        #[serde(default)]
        initiator: Option<UserRef>,
    },
}

impl LifecycleEvent {
    /// Address lists configured on the resource this event concerns
    ///
    /// Used by the intake boundary to warn about misconfigured lists before
    /// dispatch; the dispatch policies read the snapshots directly.
    pub fn configured_address_lists(&self) -> Vec<&str> {
        match self {
            LifecycleEvent::JobRenamed { item, .. }
            | LifecycleEvent::JobUpdated { item, .. }
            | LifecycleEvent::JobDeleted { item, .. } => item
                .as_job()
                .and_then(|job| job.watcher_addresses.as_deref())
                .into_iter()
                .collect(),
            LifecycleEvent::ComputerOnline { computer, .. }
            | LifecycleEvent::ComputerOffline { computer, .. }
            | LifecycleEvent::ComputerTemporarilyOffline { computer, .. }
            | LifecycleEvent::ComputerTemporarilyOnline { computer, .. } => computer
                .property
                .as_ref()
                .map(|property| {
                    vec![
                        property.online_addresses.as_str(),
                        property.offline_addresses.as_str(),
                    ]
                })
                .unwrap_or_default(),
            LifecycleEvent::RunFinalized { .. } => Vec::new(),
        }
    }
}
