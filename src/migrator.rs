use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_inventory_tables::Migration),
            Box::new(m20240101_000002_create_procurement_tables::Migration),
            Box::new(m20240101_000003_create_billing_tables::Migration),
            Box::new(m20240101_000004_create_activity_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).string().null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

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
                        .col(ColumnDef::new(Suppliers::ContactName).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Address).string().null())
                        .col(
                            ColumnDef::new(Suppliers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Sku).string().not_null().unique_key())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::Description).string().null())
                        .col(ColumnDef::new(Items::CategoryId).uuid().null())
                        .col(ColumnDef::new(Items::SupplierId).uuid().null())
                        .col(ColumnDef::new(Items::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Items::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::QuantityOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category_id")
                        .table(Items::Table)
                        .col(Items::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_supplier_id")
                        .table(Items::Table)
                        .col(Items::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockBatches::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockBatches::BatchNo).string().not_null())
                        .col(
                            ColumnDef::new(StockBatches::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockBatches::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockBatches::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(StockBatches::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One lot per item and batch number
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_stock_batches_item_batch_no")
                        .table(StockBatches::Table)
                        .col(StockBatches::ItemId)
                        .col(StockBatches::BatchNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockInHeaders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockInHeaders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockInHeaders::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockInHeaders::PurchaseOrderId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(StockInHeaders::Reference).string().null())
                        .col(ColumnDef::new(StockInHeaders::ReceivedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockInHeaders::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockInHeaders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockInLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockInLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockInLines::StockInId).uuid().not_null())
                        .col(ColumnDef::new(StockInLines::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockInLines::BatchId).uuid().not_null())
                        .col(ColumnDef::new(StockInLines::Quantity).integer().not_null())
                        .col(ColumnDef::new(StockInLines::UnitCost).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_in_lines_stock_in_id")
                        .table(StockInLines::Table)
                        .col(StockInLines::StockInId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockOutHeaders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockOutHeaders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockOutHeaders::Reason).string().not_null())
                        .col(ColumnDef::new(StockOutHeaders::Reference).string().null())
                        .col(ColumnDef::new(StockOutHeaders::RecordedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockOutHeaders::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockOutHeaders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockOutLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockOutLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockOutLines::StockOutId).uuid().not_null())
                        .col(ColumnDef::new(StockOutLines::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockOutLines::BatchId).uuid().not_null())
                        .col(ColumnDef::new(StockOutLines::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_out_lines_stock_out_id")
                        .table(StockOutLines::Table)
                        .col(StockOutLines::StockOutId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::BatchId).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustments::QuantityDelta)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::AdjustedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                StockAdjustments::Table.into_iden(),
                StockOutLines::Table.into_iden(),
                StockOutHeaders::Table.into_iden(),
                StockInLines::Table.into_iden(),
                StockInHeaders::Table.into_iden(),
                StockBatches::Table.into_iden(),
                Items::Table.into_iden(),
                Suppliers::Table.into_iden(),
                Categories::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Categories {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        ContactName,
        Email,
        Phone,
        Address,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Items {
        Table,
        Id,
        Sku,
        Name,
        Description,
        CategoryId,
        SupplierId,
        Unit,
        UnitCost,
        QuantityOnHand,
        ReorderLevel,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum StockBatches {
        Table,
        Id,
        ItemId,
        BatchNo,
        Quantity,
        UnitCost,
        ExpiryDate,
        ReceivedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum StockInHeaders {
        Table,
        Id,
        SupplierId,
        PurchaseOrderId,
        Reference,
        ReceivedBy,
        ReceivedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum StockInLines {
        Table,
        Id,
        StockInId,
        ItemId,
        BatchId,
        Quantity,
        UnitCost,
    }

    #[derive(DeriveIden)]
    pub enum StockOutHeaders {
        Table,
        Id,
        Reason,
        Reference,
        RecordedBy,
        RecordedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum StockOutLines {
        Table,
        Id,
        StockOutId,
        ItemId,
        BatchId,
        Quantity,
    }

    #[derive(DeriveIden)]
    pub enum StockAdjustments {
        Table,
        Id,
        ItemId,
        BatchId,
        QuantityDelta,
        Reason,
        AdjustedBy,
        CreatedAt,
    }
}

mod m20240101_000002_create_procurement_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_procurement_tables"
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
                            ColumnDef::new(PurchaseOrders::PoNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Notes).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ExpectedAt).date().null())
                        .col(ColumnDef::new(PurchaseOrders::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
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
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityOrdered)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::QuantityReceived)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_order_lines_po_id")
                        .table(PurchaseOrderLines::Table)
                        .col(PurchaseOrderLines::PurchaseOrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(PurchaseOrderLines::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(PurchaseOrders::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrders {
        Table,
        Id,
        PoNumber,
        SupplierId,
        Status,
        Notes,
        OrderedAt,
        ExpectedAt,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        ItemId,
        QuantityOrdered,
        QuantityReceived,
        UnitCost,
    }
}

mod m20240101_000003_create_billing_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_billing_tables"
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
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::PatientId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::PatientName).string().not_null())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(ColumnDef::new(Invoices::Notes).string().null())
                        .col(
                            ColumnDef::new(Invoices::IssuedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_patient_id")
                        .table(Invoices::Table)
                        .col(Invoices::PatientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_status")
                        .table(Invoices::Table)
                        .col(Invoices::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TreatmentCharges::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TreatmentCharges::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TreatmentCharges::InvoiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(TreatmentCharges::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TreatmentCharges::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(TreatmentCharges::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TreatmentCharges::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_treatment_charges_invoice_id")
                        .table(TreatmentCharges::Table)
                        .col(TreatmentCharges::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(
                            ColumnDef::new(Payments::PaidAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::RecordedBy).uuid().null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_invoice_id")
                        .table(Payments::Table)
                        .col(Payments::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Installments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Installments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Installments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Installments::Sequence).integer().not_null())
                        .col(ColumnDef::new(Installments::DueDate).date().not_null())
                        .col(ColumnDef::new(Installments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Installments::Status).string().not_null())
                        .col(ColumnDef::new(Installments::PaymentId).uuid().null())
                        .col(
                            ColumnDef::new(Installments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Installments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_installments_invoice_id")
                        .table(Installments::Table)
                        .col(Installments::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Adjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Adjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Adjustments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Adjustments::Kind).string().not_null())
                        .col(ColumnDef::new(Adjustments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Adjustments::Reason).string().not_null())
                        .col(ColumnDef::new(Adjustments::AppliedBy).uuid().null())
                        .col(
                            ColumnDef::new(Adjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_adjustments_invoice_id")
                        .table(Adjustments::Table)
                        .col(Adjustments::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentLinks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentLinks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentLinks::InvoiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(PaymentLinks::ProviderRef)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentLinks::CheckoutUrl)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentLinks::QrCodeData).string().null())
                        .col(ColumnDef::new(PaymentLinks::Amount).decimal().not_null())
                        .col(ColumnDef::new(PaymentLinks::Status).string().not_null())
                        .col(
                            ColumnDef::new(PaymentLinks::RequestedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentLinks::ConfirmedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(PaymentLinks::PaymentId).uuid().null())
                        .col(
                            ColumnDef::new(PaymentLinks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentLinks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_links_invoice_id")
                        .table(PaymentLinks::Table)
                        .col(PaymentLinks::InvoiceId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                PaymentLinks::Table.into_iden(),
                Adjustments::Table.into_iden(),
                Installments::Table.into_iden(),
                Payments::Table.into_iden(),
                TreatmentCharges::Table.into_iden(),
                Invoices::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        PatientId,
        PatientName,
        Status,
        Notes,
        IssuedAt,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum TreatmentCharges {
        Table,
        Id,
        InvoiceId,
        Description,
        Quantity,
        UnitPrice,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Payments {
        Table,
        Id,
        InvoiceId,
        Amount,
        Method,
        Reference,
        PaidAt,
        RecordedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Installments {
        Table,
        Id,
        InvoiceId,
        Sequence,
        DueDate,
        Amount,
        Status,
        PaymentId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Adjustments {
        Table,
        Id,
        InvoiceId,
        Kind,
        Amount,
        Reason,
        AppliedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum PaymentLinks {
        Table,
        Id,
        InvoiceId,
        ProviderRef,
        CheckoutUrl,
        QrCodeData,
        Amount,
        Status,
        RequestedAt,
        ConfirmedAt,
        PaymentId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_activity_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_activity_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActivityLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ActivityLogs::ActorId).uuid().null())
                        .col(ColumnDef::new(ActivityLogs::ActorName).string().null())
                        .col(ColumnDef::new(ActivityLogs::Action).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::EntityId).uuid().not_null())
                        .col(ColumnDef::new(ActivityLogs::Details).text().null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_activity_logs_entity")
                        .table(ActivityLogs::Table)
                        .col(ActivityLogs::EntityType)
                        .col(ActivityLogs::EntityId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ActivityLogs::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ActivityLogs {
        Table,
        Id,
        ActorId,
        ActorName,
        Action,
        EntityType,
        EntityId,
        Details,
        CreatedAt,
    }
}
