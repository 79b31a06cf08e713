pub mod audit;
pub mod budgets;
pub mod common;
pub mod invoices;
pub mod notifications;
pub mod orders;
pub mod quotations;
pub mod requests;
pub mod schedules;
pub mod suppliers;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub requests: Arc<crate::services::requests::RequestLifecycleService>,
    pub quotations: Arc<crate::services::quotations::QuotationService>,
    pub orders: Arc<crate::services::orders::PurchaseOrderService>,
    pub budgets: Arc<crate::services::budgets::BudgetService>,
    pub suppliers: Arc<crate::services::suppliers::SupplierService>,
    pub invoices: Arc<crate::services::invoices::InvoiceService>,
    pub notifications: Arc<crate::services::notifications::NotificationService>,
    pub schedules: Arc<crate::services::schedules::ScheduleService>,
    pub audit: Arc<crate::services::audit::AuditService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let requests = Arc::new(crate::services::requests::RequestLifecycleService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let quotations = Arc::new(crate::services::quotations::QuotationService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::orders::PurchaseOrderService::new(
            db_pool.clone(),
            event_sender,
        ));
        let budgets = Arc::new(crate::services::budgets::BudgetService::new(db_pool.clone()));
        let suppliers = Arc::new(crate::services::suppliers::SupplierService::new(
            db_pool.clone(),
        ));
        let invoices = Arc::new(crate::services::invoices::InvoiceService::new(
            db_pool.clone(),
        ));
        let notifications = Arc::new(crate::services::notifications::NotificationService::new(
            db_pool.clone(),
        ));
        let schedules = Arc::new(crate::services::schedules::ScheduleService::new(
            db_pool.clone(),
        ));
        let audit = Arc::new(crate::services::audit::AuditService::new(db_pool));

        Self {
            requests,
            quotations,
            orders,
            budgets,
            suppliers,
            invoices,
            notifications,
            schedules,
            audit,
        }
    }
}
