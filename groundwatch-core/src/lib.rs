pub mod alert_store;
pub mod alerting;
pub mod analysis;
pub mod assessment;
pub mod error;
pub mod history;
pub mod intake;
pub mod pollution_index;
