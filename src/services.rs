pub mod auth;
pub mod document_service;
pub mod stock_service;
pub mod folio_service;
pub mod fulfillment_service;
pub mod payment_service;
pub mod collections_service;
pub mod cancellation_service;
