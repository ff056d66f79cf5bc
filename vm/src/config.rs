use serde::{Deserialize, Serialize};

/// Tuning knobs for a VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Instructions `step_over` executes before handing back a snapshot so
    /// the host can keep its event loop responsive.
    pub step_over_limit: usize,
    /// Instructions a host executes per `run` call when it has no opinion.
    pub default_budget: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            step_over_limit: 1000,
            default_budget: 10_000,
        }
    }
}
