pub mod auth;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod payments;
pub mod products;
pub mod quotations;
pub mod sales;
pub mod tenancy;
