pub mod repo;
pub mod repo_types;
pub mod services;

#[cfg(test)]
pub mod memory;
