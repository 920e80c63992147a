#[cfg(test)]
pub mod marketplace_flow_tests;
#[cfg(test)]
pub mod utils;
