pub mod credit;
pub mod drawdown;
pub mod gateway;
pub mod plans;
pub mod subscription;
pub mod sweep;
