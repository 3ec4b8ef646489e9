use crate::storage::StoredFile;

/// Everything read from one multipart upload request.
///
/// `a` and `b` are kept as submitted; the upload handler does not interpret them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub a: Option<String>,
    pub b: Option<String>,
    /// `None` when the form had no `file` part or the part had no filename
    pub file: Option<StoredFile>,
}
