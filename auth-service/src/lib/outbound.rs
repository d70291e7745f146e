pub mod hashing;
pub mod notifier;
pub mod repositories;
