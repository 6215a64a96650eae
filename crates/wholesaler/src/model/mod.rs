mod order;

pub use self::order::{
    GroupItem, Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, UNKNOWN_PRODUCT,
    WholesalerGroup, WholesalerNotification,
};
