pub mod access;
pub mod authentication;
pub mod health;
pub mod token;
pub mod user;
