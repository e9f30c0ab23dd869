//! Raw samples as delivered by a sampling session
//!
//! Frames arrive already annotated by whatever resolver the session uses.
//! Nothing here parses binaries; a frame only carries what is known about
//! it and derives its display/comparison key on demand.

use serde::{Deserialize, Serialize};

/// Placeholder for a missing symbol or module name.
pub const UNKNOWN: &str = "UNKNOWN";

/// Event name reserved for off-CPU ("blocked") samples.
pub const BLOCKED_EVENT: &str = "context-switches";

/// One stack level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Resolved symbol name, if any. `UNKNOWN` counts as unresolved.
    #[serde(default, rename = "symbol", skip_serializing_if = "Option::is_none")]
    pub symbol_name: Option<String>,

    /// Address relative to the owning module's mapping, 0 if unknown.
    #[serde(default, rename = "module_addr")]
    pub module_relative_addr: u64,

    /// Raw virtual address.
    #[serde(default, rename = "addr")]
    pub absolute_addr: u64,

    /// Owning binary or library path.
    #[serde(default, rename = "module", skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl Frame {
    /// Frame known only by its raw address.
    #[must_use]
    pub fn from_address(absolute_addr: u64) -> Self {
        Self { absolute_addr, ..Self::default() }
    }

    /// Stable identifier used for grouping and display.
    ///
    /// Symbol name when resolved, otherwise the module-relative address when
    /// known, otherwise the absolute address (both as `0x…` lowercase hex).
    #[must_use]
    pub fn identity(&self) -> String {
        match self.symbol_name.as_deref() {
            Some(name) if !name.is_empty() && name != UNKNOWN => name.to_string(),
            _ if self.module_relative_addr != 0 => format!("0x{:x}", self.module_relative_addr),
            _ => format!("0x{:x}", self.absolute_addr),
        }
    }

    /// Module path, or `UNKNOWN` when the frame has none.
    #[must_use]
    pub fn module_or_unknown(&self) -> &str {
        match self.module_name.as_deref() {
            Some(module) if !module.is_empty() => module,
            _ => UNKNOWN,
        }
    }
}

/// One raw PMU event instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Sampled event, or [`BLOCKED_EVENT`] for off-CPU samples.
    #[serde(rename = "event")]
    pub event_name: String,

    /// Accounted period / count of this instance.
    pub weight: u64,

    /// Innermost frame first. Empty stacks are never aggregated.
    #[serde(default)]
    pub stack: Vec<Frame>,
}

impl Sample {
    /// Whether this sample represents time spent off-CPU.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.event_name == BLOCKED_EVENT
    }
}
