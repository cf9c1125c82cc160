// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{
        CustomerRepository, DocumentRepository, ProductRepository, SaleRepository,
        TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, cancellation_service::CancellationService,
        collections_service::CollectionsService, document_service::DocumentService,
        folio_service::FolioService, fulfillment_service::FulfillmentService,
        payment_service::PaymentService, stock_service::StockService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,

    pub auth_service: AuthService,
    pub tenant_repo: TenantRepository,
    pub product_repo: ProductRepository,
    pub customer_repo: CustomerRepository,
    pub sale_repo: SaleRepository,

    pub stock_service: StockService,
    pub document_service: DocumentService,
    pub fulfillment_service: FulfillmentService,
    pub payment_service: PaymentService,
    pub collections_service: CollectionsService,
    pub cancellation_service: CancellationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL debe estar definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET debe estar definido");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexión con la base de datos establecida");

        // --- Grafo de dependencias ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new();
        let customer_repo = CustomerRepository::new();
        let sale_repo = SaleRepository::new();
        let document_repo = DocumentRepository::new();

        let auth_service = AuthService::new(user_repo, jwt_secret, db_pool.clone());
        let folio_service = FolioService::new();
        let stock_service = StockService::new(product_repo.clone());
        let document_service = DocumentService::new(
            document_repo.clone(),
            customer_repo.clone(),
            product_repo.clone(),
            folio_service.clone(),
        );
        let fulfillment_service = FulfillmentService::new(
            document_repo.clone(),
            customer_repo.clone(),
            sale_repo.clone(),
            product_repo.clone(),
            stock_service.clone(),
            folio_service.clone(),
        );
        let payment_service = PaymentService::new(customer_repo.clone(), sale_repo.clone());
        let collections_service =
            CollectionsService::new(sale_repo.clone(), customer_repo.clone());
        let cancellation_service = CancellationService::new(
            sale_repo.clone(),
            customer_repo.clone(),
            stock_service.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            tenant_repo,
            product_repo,
            customer_repo,
            sale_repo,
            stock_service,
            document_service,
            fulfillment_service,
            payment_service,
            collections_service,
            cancellation_service,
        })
    }
}
