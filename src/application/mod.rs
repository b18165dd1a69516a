pub mod customers;
pub mod error;
pub mod messages;
pub mod pagination;
pub mod products;
pub mod repos;
pub mod sales;
