use std::path::Path;

/// Common trait for configuration types
pub trait Configuration {
    /// Returns the file path this configuration was loaded from, if any
    fn config_path(&self) -> Option<&Path>;

    /// Returns a string identifier for the configuration type
    fn config_type(&self) -> &str;

    /// Validates the configuration
    fn validate(&self) -> anyhow::Result<()>;
}

/// Trait for configurations with path elements that need expansion
pub trait PathConfiguration: Configuration {
    /// Returns a copy with `~`/`$VAR` expanded and relative paths resolved
    /// against `config_dir`
    fn with_expanded_paths(&self, config_dir: &Path) -> anyhow::Result<Self>
    where
        Self: Sized;
}

/// Trait for configurations that can be merged together
pub trait MergeableConfiguration<T> {
    /// Merges this configuration with another, with the other taking precedence
    fn merge_with(&self, other: &T) -> anyhow::Result<Self>
    where
        Self: Sized;
}
