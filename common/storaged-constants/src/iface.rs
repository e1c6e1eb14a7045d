//! Interface suffixes, appended to the configured interface prefix.

pub const MANAGER: &str = ".Manager";
pub const MANAGER_LVM2: &str = ".Manager.LVM2";
pub const MANAGER_NVME: &str = ".Manager.NVMe";
pub const MANAGER_ISCSI_INITIATOR: &str = ".Manager.ISCSI.Initiator";

pub const BLOCK: &str = ".Block";
pub const DRIVE: &str = ".Drive";
pub const ENCRYPTED: &str = ".Encrypted";
pub const FILESYSTEM: &str = ".Filesystem";

pub const VOLUME_GROUP: &str = ".VolumeGroup";
pub const PHYSICAL_VOLUME: &str = ".PhysicalVolume";
pub const LOGICAL_VOLUME: &str = ".LogicalVolume";
pub const VDO_VOLUME: &str = ".VDOVolume";

pub const NVME_CONTROLLER: &str = ".NVMe.Controller";
pub const NVME_FABRICS: &str = ".NVMe.Fabrics";
pub const NVME_NAMESPACE: &str = ".NVMe.Namespace";

pub const ISCSI_SESSION: &str = ".ISCSI.Session";
