pub mod answer;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;
