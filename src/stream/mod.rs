//! Stream combinators for snapshot subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
