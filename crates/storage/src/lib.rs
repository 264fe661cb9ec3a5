pub mod cache;
pub mod db;
pub mod errors;
pub mod registration;
pub mod tables;
