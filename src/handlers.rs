pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod leads;
pub mod notifications;
pub mod portal;
pub mod products;
pub mod projects;
pub mod services;
pub mod tickets;
pub mod users;
