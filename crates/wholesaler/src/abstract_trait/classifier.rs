use crate::domain::recovery::{NotificationContext, RecoveryAction};
use std::sync::Arc;

pub type DynFailureClassifier = Arc<dyn FailureClassifier + Send + Sync>;

/// Decides what to do with a wholesaler notification that failed after
/// all in-process retries.
pub trait FailureClassifier {
    fn classify(&self, error_message: &str, context: &NotificationContext<'_>) -> RecoveryAction;
}
