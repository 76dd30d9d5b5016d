//! Maps transport failures to what the session loop should do next.

use crate::transport::TransportError;

/// Disposition of a failed transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Retry the same operation (bounded).
    Transient,
    /// The server lost the partial upload a stored record points to.
    Unresumable,
    /// Give up on this file without retrying.
    Fatal,
}

/// Classifies `err`.
///
/// `has_resume_context` is true when a resume record exists for the session
/// being driven; only then is a vanished session reported as unresumable
/// (the stale record is what the user has to clear).
pub fn classify(err: &TransportError, has_resume_context: bool) -> Disposition {
    match err {
        TransportError::Gone { .. } if has_resume_context => Disposition::Unresumable,
        TransportError::Gone { .. } => Disposition::Fatal,
        TransportError::Network(_) | TransportError::Unavailable { .. } => Disposition::Transient,
        TransportError::Unauthorized { .. }
        | TransportError::Rejected { .. }
        | TransportError::Status { .. }
        | TransportError::Protocol(_) => Disposition::Fatal,
    }
}
