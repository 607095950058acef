//! Cache access notifications.
//!
//! The owning cache describes every demand access it handles with an
//! [`AccessInfo`]. The controller reads the hit flag for its own miss-rate
//! bookkeeping and hands the notification, unchanged, to the active child.

use serde::{Deserialize, Serialize};

/// Type of memory access that reached the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AccessType {
    /// Instruction fetch.
    Fetch,
    /// Data load.
    #[default]
    Read,
    /// Data store.
    Write,
}

/// Identity of the agent that issued the access (core, hardware thread, DMA
/// engine). Opaque to the controller; children may use it to split streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requestor(pub u32);

/// One demand access observed by the owning cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessInfo {
    /// Global simulated tick at which the access was handled.
    pub tick: u64,
    /// Accessed (physical) address.
    pub addr: u64,
    /// Program counter of the instruction that caused the access, if known.
    #[serde(default)]
    pub pc: Option<u64>,
    /// Requestor identity.
    #[serde(default)]
    pub requestor: Requestor,
    /// Kind of access.
    #[serde(default)]
    pub kind: AccessType,
    /// Whether the access hit in the owning cache.
    pub hit: bool,
}

impl AccessInfo {
    /// Creates a data-read notification with no PC context.
    ///
    /// # Arguments
    ///
    /// * `tick` - Simulated tick of the access.
    /// * `addr` - Accessed address.
    /// * `hit` - Whether the access hit in the owning cache.
    pub const fn new(tick: u64, addr: u64, hit: bool) -> Self {
        Self {
            tick,
            addr,
            pc: None,
            requestor: Requestor(0),
            kind: AccessType::Read,
            hit,
        }
    }

    /// Attaches the program counter of the triggering instruction.
    #[must_use]
    pub const fn with_pc(mut self, pc: u64) -> Self {
        self.pc = Some(pc);
        self
    }

    /// Attaches the requestor identity.
    #[must_use]
    pub const fn with_requestor(mut self, requestor: Requestor) -> Self {
        self.requestor = requestor;
        self
    }

    /// Sets the access kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: AccessType) -> Self {
        self.kind = kind;
        self
    }
}
