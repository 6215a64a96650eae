mod classifier;
mod order_store;
mod service;
mod transport;

pub use self::classifier::{DynFailureClassifier, FailureClassifier};
pub use self::order_store::{DynOrderStore, OrderStoreTrait};
pub use self::service::{DynWholesalerNotificationService, WholesalerNotificationServiceTrait};
pub use self::transport::{
    DynNotificationTransport, NotificationReceipt, NotificationTransportTrait, TransportError,
};
