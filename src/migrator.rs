use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_requests_tables::Migration),
            Box::new(m20240101_000003_create_suppliers_table::Migration),
            Box::new(m20240101_000004_create_quotations_tables::Migration),
            Box::new(m20240101_000005_create_purchase_orders_table::Migration),
            Box::new(m20240101_000006_create_invoices_table::Migration),
            Box::new(m20240101_000007_create_budgets_table::Migration),
            Box::new(m20240101_000008_create_schedule_tables::Migration),
            Box::new(m20240101_000009_create_notifications_table::Migration),
            Box::new(m20240101_000010_create_audit_log_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Role)
                                .string()
                                .not_null()
                                .check(Expr::col(Users::Role).is_in([
                                    "solicitante",
                                    "comprador",
                                    "director",
                                    "admin",
                                ])),
                        )
                        .col(ColumnDef::new(Users::Area).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Name,
        Email,
        Role,
        Area,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_requests_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_users_table::Users;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_requests_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // The status strings are wire contract with the frontend; the
            // CHECK constraint is the last line of defense against stray
            // writes.
            manager
                .create_table(
                    Table::create()
                        .table(Requests::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Requests::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Requests::Folio)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Requests::UserId).uuid().not_null())
                        .col(ColumnDef::new(Requests::Area).string().not_null())
                        .col(
                            ColumnDef::new(Requests::Priority)
                                .string()
                                .not_null()
                                .default("normal")
                                .check(Expr::col(Requests::Priority).is_in([
                                    "normal", "urgente", "critica",
                                ])),
                        )
                        .col(ColumnDef::new(Requests::Justification).text().not_null())
                        .col(ColumnDef::new(Requests::DeliveryDate).timestamp().null())
                        .col(
                            ColumnDef::new(Requests::Status)
                                .string()
                                .not_null()
                                .default("pendiente")
                                .check(Expr::col(Requests::Status).is_in([
                                    "borrador",
                                    "programada",
                                    "pendiente",
                                    "autorizada",
                                    "cotizando",
                                    "emitida",
                                    "en_transito",
                                    "recibida",
                                    "rechazada",
                                    "cancelada",
                                ])),
                        )
                        .col(ColumnDef::new(Requests::AuthorizedBy).uuid().null())
                        .col(ColumnDef::new(Requests::AuthorizedAt).timestamp().null())
                        .col(ColumnDef::new(Requests::RejectionReason).text().null())
                        .col(
                            ColumnDef::new(Requests::IsDraft)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Requests::ScheduledFor).timestamp().null())
                        .col(
                            ColumnDef::new(Requests::BudgetApproved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Requests::Notes).text().null())
                        .col(ColumnDef::new(Requests::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Requests::UpdatedAt).timestamp().null())
                        .col(
                            ColumnDef::new(Requests::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_requests_user_id")
                                .from(Requests::Table, Requests::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requests_status")
                        .table(Requests::Table)
                        .col(Requests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requests_area")
                        .table(Requests::Table)
                        .col(Requests::Area)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requests_scheduled_for")
                        .table(Requests::Table)
                        .col(Requests::ScheduledFor)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequestItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequestItems::RequestId).uuid().not_null())
                        .col(ColumnDef::new(RequestItems::Material).string().not_null())
                        .col(ColumnDef::new(RequestItems::Specification).text().null())
                        .col(
                            ColumnDef::new(RequestItems::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(RequestItems::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(RequestItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(RequestItems::ApproxUnitCost)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::InStock)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(RequestItems::StockLocation).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_request_items_request_id")
                                .from(RequestItems::Table, RequestItems::RequestId)
                                .to(Requests::Table, Requests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_request_items_request_id")
                        .table(RequestItems::Table)
                        .col(RequestItems::RequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequestItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Requests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Requests {
        Table,
        Id,
        Folio,
        UserId,
        Area,
        Priority,
        Justification,
        DeliveryDate,
        Status,
        AuthorizedBy,
        AuthorizedAt,
        RejectionReason,
        IsDraft,
        ScheduledFor,
        BudgetApproved,
        Notes,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    pub(super) enum RequestItems {
        Table,
        Id,
        RequestId,
        Material,
        Specification,
        Quantity,
        Unit,
        ApproxUnitCost,
        InStock,
        StockLocation,
    }
}

mod m20240101_000003_create_suppliers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::Rfc)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::ContactName).string().null())
                        .col(ColumnDef::new(Suppliers::ContactEmail).string().null())
                        .col(ColumnDef::new(Suppliers::ContactPhone).string().null())
                        .col(ColumnDef::new(Suppliers::Category).string().null())
                        .col(ColumnDef::new(Suppliers::Rating).integer().null())
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CanInvoice)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Suppliers::Notes).text().null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Suppliers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_category")
                        .table(Suppliers::Table)
                        .col(Suppliers::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        Rfc,
        ContactName,
        ContactEmail,
        ContactPhone,
        Category,
        Rating,
        IsActive,
        CanInvoice,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_quotations_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_users_table::Users;
    use super::m20240101_000002_create_requests_tables::{RequestItems, Requests};
    use super::m20240101_000003_create_suppliers_table::Suppliers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_quotations_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Quotations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotations::RequestId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(Quotations::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Quotations::PaymentTerms).string().null())
                        .col(ColumnDef::new(Quotations::ValidUntil).timestamp().null())
                        .col(ColumnDef::new(Quotations::SubmittedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Quotations::IsSelected)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Quotations::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotations_request_id")
                                .from(Quotations::Table, Quotations::RequestId)
                                .to(Requests::Table, Requests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotations_supplier_id")
                                .from(Quotations::Table, Quotations::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotations_submitted_by")
                                .from(Quotations::Table, Quotations::SubmittedBy)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One quotation per supplier per request; the application maps
            // violations to DuplicateQuotation.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotations_request_supplier")
                        .table(Quotations::Table)
                        .col(Quotations::RequestId)
                        .col(Quotations::SupplierId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuotationItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationItems::QuotationId).uuid().not_null())
                        .col(
                            ColumnDef::new(QuotationItems::RequestItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .check(Expr::col(QuotationItems::UnitPrice).gte(0)),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::HasInvoice)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::DeliveryDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::HasWarranty)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::WarrantyMonths)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::IsSelected)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_items_quotation_id")
                                .from(QuotationItems::Table, QuotationItems::QuotationId)
                                .to(Quotations::Table, Quotations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_items_request_item_id")
                                .from(QuotationItems::Table, QuotationItems::RequestItemId)
                                .to(RequestItems::Table, RequestItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotation_items_request_item_id")
                        .table(QuotationItems::Table)
                        .col(QuotationItems::RequestItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotation_items_quotation_id")
                        .table(QuotationItems::Table)
                        .col(QuotationItems::QuotationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuotationItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Quotations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Quotations {
        Table,
        Id,
        RequestId,
        SupplierId,
        TotalAmount,
        PaymentTerms,
        ValidUntil,
        SubmittedBy,
        IsSelected,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum QuotationItems {
        Table,
        Id,
        QuotationId,
        RequestItemId,
        UnitPrice,
        Subtotal,
        HasInvoice,
        DeliveryDate,
        HasWarranty,
        WarrantyMonths,
        IsSelected,
    }
}

mod m20240101_000005_create_purchase_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_requests_tables::Requests;
    use super::m20240101_000003_create_suppliers_table::Suppliers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_purchase_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Folio)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::RequestId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().null())
                        .col(ColumnDef::new(PurchaseOrders::QuotationId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ExpectedDelivery)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ActualDelivery)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string()
                                .not_null()
                                .default("emitida")
                                .check(Expr::col(PurchaseOrders::Status).is_in([
                                    "emitida",
                                    "en_transito",
                                    "recibida",
                                    "cancelada",
                                ])),
                        )
                        .col(ColumnDef::new(PurchaseOrders::PdfPath).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::RequiresInvoice)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_request_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::RequestId)
                                .to(Requests::Table, Requests::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_request_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::RequestId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_status")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrders {
        Table,
        Id,
        Folio,
        RequestId,
        SupplierId,
        QuotationId,
        OrderDate,
        ExpectedDelivery,
        ActualDelivery,
        TotalAmount,
        Status,
        PdfPath,
        RequiresInvoice,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_invoices_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000005_create_purchase_orders_table::PurchaseOrders;
    use super::m20240101_000003_create_suppliers_table::Suppliers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::InvoiceDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::Tax).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Invoices::Total)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::FilePath).string().null())
                        .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_purchase_order_id")
                                .from(Invoices::Table, Invoices::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_supplier_id")
                                .from(Invoices::Table, Invoices::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_purchase_order_id")
                        .table(Invoices::Table)
                        .col(Invoices::PurchaseOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Invoices {
        Table,
        Id,
        PurchaseOrderId,
        SupplierId,
        InvoiceNumber,
        InvoiceDate,
        Subtotal,
        Tax,
        Total,
        FilePath,
        CreatedAt,
    }
}

mod m20240101_000007_create_budgets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_budgets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Budgets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Budgets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Budgets::Area).string().not_null())
                        .col(ColumnDef::new(Budgets::Year).integer().not_null())
                        .col(
                            ColumnDef::new(Budgets::TotalAmount)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Budgets::SpentAmount)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_budgets_area_year")
                        .table(Budgets::Table)
                        .col(Budgets::Area)
                        .col(Budgets::Year)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Budgets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Budgets {
        Table,
        Id,
        Area,
        Year,
        TotalAmount,
        SpentAmount,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000008_create_schedule_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_users_table::Users;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_schedule_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AreaSchedules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AreaSchedules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AreaSchedules::Area).string().not_null())
                        .col(
                            ColumnDef::new(AreaSchedules::OpensAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AreaSchedules::ClosesAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AreaSchedules::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(AreaSchedules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(AreaSchedules::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_area_schedules_created_by")
                                .from(AreaSchedules::Table, AreaSchedules::CreatedBy)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(NoRequirements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(NoRequirements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(NoRequirements::Area).string().not_null())
                        .col(ColumnDef::new(NoRequirements::Year).integer().not_null())
                        .col(ColumnDef::new(NoRequirements::Month).integer().not_null())
                        .col(
                            ColumnDef::new(NoRequirements::DeclaredBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(NoRequirements::Note).text().null())
                        .col(
                            ColumnDef::new(NoRequirements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_no_requirements_declared_by")
                                .from(NoRequirements::Table, NoRequirements::DeclaredBy)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_no_requirements_area_period")
                        .table(NoRequirements::Table)
                        .col(NoRequirements::Area)
                        .col(NoRequirements::Year)
                        .col(NoRequirements::Month)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(NoRequirements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AreaSchedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AreaSchedules {
        Table,
        Id,
        Area,
        OpensAt,
        ClosesAt,
        CreatedBy,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum NoRequirements {
        Table,
        Id,
        Area,
        Year,
        Month,
        DeclaredBy,
        Note,
        CreatedAt,
    }
}

mod m20240101_000009_create_notifications_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_users_table::Users;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                        .col(ColumnDef::new(Notifications::Kind).string().not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Message).text().not_null())
                        .col(ColumnDef::new(Notifications::Link).string().null())
                        .col(
                            ColumnDef::new(Notifications::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_user_id")
                                .from(Notifications::Table, Notifications::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_user_read")
                        .table(Notifications::Table)
                        .col(Notifications::UserId)
                        .col(Notifications::IsRead)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Notifications {
        Table,
        Id,
        UserId,
        Kind,
        Title,
        Message,
        Link,
        IsRead,
        CreatedAt,
    }
}

mod m20240101_000010_create_audit_log_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_create_audit_log_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLog::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLog::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLog::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLog::EntityId).uuid().not_null())
                        .col(ColumnDef::new(AuditLog::Action).string().not_null())
                        .col(ColumnDef::new(AuditLog::ActorId).uuid().null())
                        .col(ColumnDef::new(AuditLog::OldValue).text().null())
                        .col(ColumnDef::new(AuditLog::NewValue).text().null())
                        .col(ColumnDef::new(AuditLog::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_log_entity")
                        .table(AuditLog::Table)
                        .col(AuditLog::EntityType)
                        .col(AuditLog::EntityId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLog::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AuditLog {
        Table,
        Id,
        EntityType,
        EntityId,
        Action,
        ActorId,
        OldValue,
        NewValue,
        CreatedAt,
    }
}
