//! End-to-end tests that run the validation pipeline over rule trees on disk.

#[cfg(test)]
mod validation;
