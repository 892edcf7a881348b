//! Embedded files.

/// The objects backing one embedded file.
#[derive(Debug, Copy, Clone)]
pub(crate) struct EmbeddedFileObject {
    /// The filespec dictionary object.
    pub(crate) filespec_obj: usize,
}
