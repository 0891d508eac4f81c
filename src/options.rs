//! Configuration options for statscache.

/// Default memory quota in bytes. Zero means unbounded.
pub const DEFAULT_MEM_QUOTA_BYTES: i64 = 0;

/// Cache configuration options.
///
/// The single recognized switch at the boundary of the core is
/// `enable_mem_quota`: when true, [`StatsCachePointer::new`] builds LRU
/// snapshots honoring `mem_quota_bytes`; when false, it builds unbounded
/// map snapshots.
///
/// [`StatsCachePointer::new`]: crate::StatsCachePointer::new
#[derive(Debug, Clone)]
pub struct Options {
    /// Bound cache memory by evicting item statistics on an LRU basis.
    pub enable_mem_quota: bool,

    /// Memory quota in bytes for tracked statistics. Zero means unbounded.
    pub mem_quota_bytes: i64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            enable_mem_quota: false,
            mem_quota_bytes: DEFAULT_MEM_QUOTA_BYTES,
        }
    }
}

impl Options {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for options.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Validate the options.
    ///
    /// A disabled or unbounded quota is expressed as zero; a negative quota
    /// at the configuration boundary is a mistake and is rejected.
    pub fn validate(&self) -> crate::Result<()> {
        if self.enable_mem_quota && self.mem_quota_bytes < 0 {
            return Err(crate::Error::invalid_configuration(
                "mem_quota_bytes must not be negative; use 0 for unbounded",
            ));
        }
        Ok(())
    }
}

/// Builder for Options.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set enable_mem_quota.
    pub fn enable_mem_quota(mut self, value: bool) -> Self {
        self.options.enable_mem_quota = value;
        self
    }

    /// Set mem_quota_bytes.
    pub fn mem_quota_bytes(mut self, bytes: i64) -> Self {
        self.options.mem_quota_bytes = bytes;
        self
    }

    /// Build the options.
    pub fn build(self) -> crate::Result<Options> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert!(!opts.enable_mem_quota);
        assert_eq!(opts.mem_quota_bytes, DEFAULT_MEM_QUOTA_BYTES);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        let mut opts = Options::default();
        opts.enable_mem_quota = true;
        opts.mem_quota_bytes = 1024;
        assert!(opts.validate().is_ok());

        opts.mem_quota_bytes = -1;
        assert!(opts.validate().is_err());

        // A negative quota with the quota disabled is never consulted.
        opts.enable_mem_quota = false;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_builder() {
        let opts = Options::builder()
            .enable_mem_quota(true)
            .mem_quota_bytes(64 * 1024 * 1024)
            .build()
            .unwrap();

        assert!(opts.enable_mem_quota);
        assert_eq!(opts.mem_quota_bytes, 64 * 1024 * 1024);

        let err = Options::builder()
            .enable_mem_quota(true)
            .mem_quota_bytes(-5)
            .build();
        assert!(err.is_err());
    }
}
