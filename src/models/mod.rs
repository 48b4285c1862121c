pub mod campaign;
pub mod candidate;
pub mod file;
pub mod list;
pub mod organization;
pub mod position;
pub mod role;
pub mod user;
