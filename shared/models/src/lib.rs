pub mod billing;
pub mod wallet;
