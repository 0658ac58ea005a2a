//! Game implementations.

pub mod catchup;
