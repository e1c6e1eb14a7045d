/// NVMe controller state once a connection is finalized.
pub const NVME_LIVE: &str = "live";

/// NVMe controller state while a connection is being established.
pub const NVME_CONNECTING: &str = "connecting";

/// Logical volume `Type` for block-backed volumes.
pub const LV_TYPE_BLOCK: &str = "block";

/// Logical volume `Type` for pools.
pub const LV_TYPE_POOL: &str = "pool";

/// Well-known discovery subsystem NQN.
pub const NVME_DISCOVERY_NQN: &str = "nqn.2014-08.org.nvmexpress.discovery";
