#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::implicit_hasher)]

pub mod audit;
pub mod automation;
pub mod error;
pub mod members;
pub mod points;
pub mod promotion;
pub mod rules;
pub mod sub_groups;
pub mod suspensions;

#[cfg(test)]
pub(crate) mod test_utils;
