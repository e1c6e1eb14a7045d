//! Keys of the `a{sv}` option dictionaries passed to administrative calls.

/// Ask the daemon to cascade removal through dependent layers.
pub const TEAR_DOWN: &str = "tear-down";

/// Persisted configuration items to register while formatting.
pub const CONFIG_ITEMS: &str = "config-items";

/// Config item field marking a record for removal together with its parents.
pub const TRACK_PARENTS: &str = "track-parents";

pub const ENCRYPT_TYPE: &str = "encrypt.type";
pub const ENCRYPT_PASSPHRASE: &str = "encrypt.passphrase";
pub const LABEL: &str = "label";
pub const ERASE: &str = "erase";

pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const REVERSE_USERNAME: &str = "reverse-username";
pub const REVERSE_PASSWORD: &str = "reverse-password";

pub const HOST_NQN: &str = "host_nqn";
pub const HOST_ID: &str = "host_id";
pub const SECURE_ERASE: &str = "secure_erase";
pub const LBA_DATA_SIZE: &str = "lba_data_size";
pub const METADATA_SIZE: &str = "metadata_size";

/// Name of the crypttab-like persisted store.
pub const STORE_CRYPTTAB: &str = "crypttab";

/// Name of the fstab-like persisted store.
pub const STORE_FSTAB: &str = "fstab";
