// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,

        // --- Catálogo ---
        handlers::products::create_product,
        handlers::products::get_all_products,
        handlers::products::get_low_stock,
        handlers::products::stock_entry,
        handlers::products::list_movements,

        // --- CRM ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::list_customer_payments,
        handlers::customers::list_customer_open_sales,

        // --- Documentos fuente ---
        handlers::quotations::create_quotation,
        handlers::quotations::convert_quotation,
        handlers::orders::create_order,
        handlers::orders::settle_order,

        // --- Ventas ---
        handlers::sales::get_sale,
        handlers::sales::cancel_sale,

        // --- Pagos y cobranza ---
        handlers::payments::create_payment,
        handlers::collections::aging_report,
        handlers::collections::credit_alerts,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            handlers::tenancy::CreateTenantPayload,

            // --- Catálogo e inventario ---
            models::catalog::Product,
            models::inventory::MovementType,
            models::inventory::InventoryMovement,
            models::inventory::StockShortage,
            handlers::products::CreateProductPayload,
            handlers::products::StockEntryPayload,

            // --- CRM ---
            models::crm::Customer,
            models::crm::CustomerPayment,
            handlers::customers::CreateCustomerPayload,

            // --- Documentos fuente ---
            models::documents::QuotationStatus,
            models::documents::OrderType,
            models::documents::OrderStatus,
            models::documents::Quotation,
            models::documents::QuotationItem,
            models::documents::OnlineOrder,
            models::documents::OnlineOrderItem,
            models::documents::PaymentDecision,
            models::documents::GatewaySettlement,
            handlers::quotations::DocumentLinePayload,
            handlers::quotations::CreateQuotationPayload,
            handlers::quotations::QuotationResponse,
            handlers::orders::CreateOrderPayload,
            handlers::orders::SettleOrderPayload,
            handlers::orders::OrderResponse,

            // --- Ventas ---
            models::sales::PaymentMethod,
            models::sales::SaleStatus,
            models::sales::PaymentStatus,
            models::sales::CancellationType,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleCancellation,
            models::sales::SaleDetail,
            handlers::sales::RestockItemPayload,
            handlers::sales::CancelSalePayload,

            // --- Pagos y cobranza ---
            handlers::payments::CreatePaymentPayload,
            handlers::payments::PaymentResponse,
            models::collections::AgingBucket,
            models::collections::AgingBucketSummary,
            models::collections::AgingSaleEntry,
            models::collections::DebtorSummary,
            models::collections::AgingReport,
            models::collections::CreditAlert,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticación y registro"),
        (name = "Users", description = "Datos del usuario"),
        (name = "Tenancy", description = "Gestión de empresas y acceso"),
        (name = "Catalog", description = "Catálogo de productos y stock"),
        (name = "CRM", description = "Clientes y su crédito"),
        (name = "Documents", description = "Cotizaciones y pedidos en línea"),
        (name = "Sales", description = "Ventas y cancelaciones"),
        (name = "Payments", description = "Abonos al libro de crédito"),
        (name = "Collections", description = "Cobranza: antigüedad y alertas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
