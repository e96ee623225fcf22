pub mod cadence;
pub mod notifier;
pub mod reconcile;
pub mod source;
pub mod update;
