// PRTG query translation and time-series normalization
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;
