//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config
    pub const APP_DIR: &str = "stream-profiles";

    /// Service store filename
    pub const FILENAME: &str = "services.json";

    /// Environment variable overriding the config directory
    pub const DIR_ENV_VAR: &str = "STREAM_PROFILES_CONFIG_DIR";

    /// Suffix for the temporary file written before the atomic rename
    pub const TMP_SUFFIX: &str = "tmp";
}

/// Default values for new profiles and the store
pub mod defaults {
    /// Maximum number of saved services
    pub const SERVICE_LIMIT: usize = 20;

    /// Name of the profile synthesized when the registry would be empty
    pub const DEFAULT_SERVICE_NAME: &str = "Default Service";

    /// Prefix for newly added profiles (followed by the id)
    pub const NEW_SERVICE_PREFIX: &str = "New Service";

    /// Name given to throwaway connection-test instances
    pub const TEMP_SERVICE_NAME: &str = "temp_service";

    /// Highest id ever issued or accepted from a store file
    pub const MAX_SERVICE_ID: u32 = i32::MAX as u32;
}

/// Persisted payload keys
pub mod keys {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const SERVICE: &str = "service";
    pub const SERVER: &str = "server";
    pub const KEY: &str = "key";
    pub const USE_AUTH: &str = "use_auth";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const BWTEST: &str = "bwtest";
    pub const HOTKEY_DATA: &str = "hotkey-data";
}

/// Service kind identifiers
pub mod service {
    /// Catalog-backed service kind
    pub const COMMON_KIND: &str = "rtmp_common";

    /// Custom server kind
    pub const CUSTOM_KIND: &str = "rtmp_custom";

    /// Separator between kind and id in the persisted `type` field
    pub const TYPE_SEPARATOR: char = '.';
}

/// User-facing notices
pub mod notices {
    pub const LIMIT_REACHED: &str = "You have already created the maximum number of services.";
    pub const ALL_REMOVED: &str = "You have removed all saved services.";
}

/// Connectivity probe constants
pub mod probe {
    /// Default RTMP port
    pub const RTMP_PORT: u16 = 1935;

    /// Default RTMPS port
    pub const RTMPS_PORT: u16 = 443;

    /// Default connect timeout in milliseconds
    pub const TIMEOUT_MS: u64 = 5000;
}
