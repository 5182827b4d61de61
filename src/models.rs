pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod lead;
pub mod notification;
pub mod portal;
pub mod product;
pub mod project;
pub mod rbac;
pub mod ticket;
