use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution status of a node as reported by the remote executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Failed => "failed",
        }
    }

    /// Background colour a renderer should paint a node in this status.
    pub fn colour(&self) -> &'static str {
        match self {
            NodeStatus::Success => "#d4edda",
            NodeStatus::Failed => "#f8d7da",
            NodeStatus::Running => "#fff3cd",
            NodeStatus::Pending => "#d1ecf1",
        }
    }
}

/// Colour for a node that has never been part of a run.
pub const NO_STATUS_COLOUR: &str = "#ffffff";

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NodeStatus::Pending),
            "running" => Ok(NodeStatus::Running),
            "success" => Ok(NodeStatus::Success),
            "failed" => Ok(NodeStatus::Failed),
            other => Err(other.to_string()),
        }
    }
}
