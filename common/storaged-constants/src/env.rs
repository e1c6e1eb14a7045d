/// Environment variable naming a TOML file with harness configuration.
pub const CONFIG_FILE: &str = "STORAGED_TEST_CONFIG";

/// Prefix of environment variables overriding harness configuration keys.
pub const CONFIG_PREFIX: &str = "STORAGED_TEST_";

/// Environment variable enabling verbose daemon output.
pub const VERBOSE: &str = "STORAGED_TEST_VERBOSE";
