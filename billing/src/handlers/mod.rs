pub mod credits;
pub mod drawdown;
pub mod plans;
pub mod subscriptions;
