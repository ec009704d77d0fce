pub mod availability;
pub mod queue;
