pub use parcel_tracking_core::{contract, notification, records, routing, storage_keys};
