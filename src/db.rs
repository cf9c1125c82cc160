pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod sale_repo;
pub use sale_repo::SaleRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
