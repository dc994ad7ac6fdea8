#[cfg(test)]
pub mod availability;
#[cfg(test)]
mod permission_test;
