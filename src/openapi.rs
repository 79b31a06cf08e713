use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Procura API",
        description = "Procurement management: purchase requests, supplier quotations, purchase orders, invoices and area budgets",
        license(name = "MIT")
    ),
    paths(
        handlers::requests::create_request,
        handlers::requests::list_requests,
        handlers::requests::get_request,
        handlers::requests::get_request_items,
        handlers::requests::submit_request,
        handlers::requests::authorize_request,
        handlers::requests::reject_request,
        handlers::requests::cancel_request,
        handlers::requests::start_quoting,
        handlers::requests::issue_order,
        handlers::requests::approve_budget,
        handlers::requests::get_comparison,
        handlers::requests::get_total_selected,
        handlers::quotations::attach_quotation,
        handlers::quotations::get_quotation,
        handlers::quotations::select_item,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::cancel_order,
        handlers::invoices::register_invoice,
        handlers::invoices::list_order_invoices,
        handlers::budgets::get_my_budget,
        handlers::budgets::get_budget,
        handlers::budgets::assign_budget,
        handlers::budgets::reconcile_budgets,
        handlers::suppliers::create_supplier,
        handlers::suppliers::list_suppliers,
        handlers::suppliers::get_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::deactivate_supplier,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::schedules::create_schedule,
        handlers::schedules::list_schedules,
        handlers::schedules::declare_no_requirement,
        handlers::schedules::list_no_requirements,
        handlers::audit::get_history,
    ),
    tags(
        (name = "requests", description = "Purchase request lifecycle"),
        (name = "quotations", description = "Supplier quotations and selection"),
        (name = "orders", description = "Purchase orders"),
        (name = "invoices", description = "Invoices against orders"),
        (name = "budgets", description = "Area budget ledger"),
        (name = "suppliers", description = "Supplier catalog"),
        (name = "notifications", description = "User notifications"),
        (name = "schedules", description = "Area schedules and declarations"),
        (name = "audit", description = "Audit trail")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
