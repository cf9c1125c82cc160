pub mod auth;
pub mod tenancy;
pub mod catalog;
pub mod crm;
pub mod documents;
pub mod sales;
pub mod inventory;
pub mod collections;
