//! Size ceilings applied while parsing a form.

pub const MEGABYTE: u64 = 1_048_576;

/// Default ceiling for bodies that can't carry files (JSON, URL encoded).
pub const DEFAULT_MAX_FORM_SIZE: u64 = MEGABYTE;

/// Default ceiling for `multipart/form-data` bodies.
pub const DEFAULT_MAX_FORM_WITH_FILES_SIZE: u64 = 10 * MEGABYTE;

/// Default number of file bytes kept in memory before spilling to temporary files.
pub const DEFAULT_MAX_MEMORY: u64 = 10 * MEGABYTE;

/// Configuration for [`FormParser`](crate::FormParser).
///
/// # Example
/// ```
/// use micro_form::{FormConfig, MEGABYTE};
///
/// let config = FormConfig::new().max_form_size(64 * 1024).max_memory(MEGABYTE);
/// assert_eq!(config.get_max_form_size(), 64 * 1024);
/// assert_eq!(config.get_max_form_with_files_size(), 10 * MEGABYTE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormConfig {
    max_form_size: u64,
    max_form_with_files_size: u64,
    max_memory: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            max_form_size: DEFAULT_MAX_FORM_SIZE,
            max_form_with_files_size: DEFAULT_MAX_FORM_WITH_FILES_SIZE,
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

impl FormConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ceiling in bytes for JSON and URL encoded bodies.
    #[must_use]
    pub fn max_form_size(mut self, size: u64) -> Self {
        self.max_form_size = size;
        self
    }

    /// Set the ceiling in bytes for multipart bodies.
    #[must_use]
    pub fn max_form_with_files_size(mut self, size: u64) -> Self {
        self.max_form_with_files_size = size;
        self
    }

    /// Set how many bytes of uploaded files are held in memory before the rest spill to disk.
    #[must_use]
    pub fn max_memory(mut self, size: u64) -> Self {
        self.max_memory = size;
        self
    }

    #[must_use]
    pub fn get_max_form_size(&self) -> u64 {
        self.max_form_size
    }

    #[must_use]
    pub fn get_max_form_with_files_size(&self) -> u64 {
        self.max_form_with_files_size
    }

    #[must_use]
    pub fn get_max_memory(&self) -> u64 {
        self.max_memory
    }
}
