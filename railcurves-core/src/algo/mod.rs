pub mod batch;

pub use batch::{bulk_time_profiles, bulk_travel_times};
