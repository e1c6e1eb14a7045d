/// Default well-known bus name of the storage daemon.
pub const DEFAULT_SERVICE: &str = "org.freedesktop.UDisks2";

/// Legacy bus name used by storaged builds.
pub const LEGACY_SERVICE: &str = "org.storaged.Storaged";

/// Default root of the daemon's object tree.
pub const DEFAULT_OBJECT_ROOT: &str = "/org/freedesktop/UDisks2";

/// Default interface prefix; interface suffixes in [`crate::iface`] are appended to it.
pub const DEFAULT_IFACE_PREFIX: &str = "org.freedesktop.UDisks2";

/// The null object path. Object-path properties read back as this value when unset.
pub const NULL_PATH: &str = "/";

/// Standard object manager interface.
pub const OBJECT_MANAGER: &str = "org.freedesktop.DBus.ObjectManager";

/// Standard properties interface.
pub const PROPERTIES: &str = "org.freedesktop.DBus.Properties";

/// Standard introspection interface.
pub const INTROSPECTABLE: &str = "org.freedesktop.DBus.Introspectable";

/// Relative path of the manager object.
pub const MANAGER_PATH: &str = "/Manager";

/// Relative path prefix of block device objects.
pub const BLOCK_DEVICES: &str = "/block_devices/";

/// Relative path prefix of drive objects.
pub const DRIVES: &str = "/drives/";

/// Relative path prefix of LVM objects.
pub const LVM: &str = "/lvm/";

/// Pattern matching iSCSI session objects, relative to the object root.
pub const ISCSI_SESSION_PATTERN: &str = r".*/iscsi/session[0-9]+$";
