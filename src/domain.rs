pub mod account;
pub mod activity;
pub mod basis;
pub mod cash;
pub mod instrument;
pub mod position;
