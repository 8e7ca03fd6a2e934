pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod technicians;
pub mod tools;
