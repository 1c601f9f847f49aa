#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audit_log;
pub mod automation;
pub mod roblox;
