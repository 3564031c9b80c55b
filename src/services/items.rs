use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{categories, items, stock_batches, suppliers},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ItemInput {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
    pub unit_cost: Decimal,
    #[validate(range(min = 0))]
    pub reorder_level: i32,
}

/// Filters accepted by the item listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    /// Only items at or below their reorder level
    pub low_stock: Option<bool>,
    pub include_inactive: Option<bool>,
}

/// Service for managing inventory items
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DatabaseConnection>,
}

impl ItemService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_item(&self, input: ItemInput) -> Result<items::Model, ServiceError> {
        if input.unit_cost < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "unit_cost cannot be negative".into(),
            ));
        }

        let existing = items::Entity::find()
            .filter(items::Column::Sku.eq(input.sku.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU '{}' already exists",
                input.sku
            )));
        }

        self.check_references(input.category_id, input.supplier_id)
            .await?;

        let now = Utc::now();
        let model = items::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            name: Set(input.name),
            description: Set(input.description),
            category_id: Set(input.category_id),
            supplier_id: Set(input.supplier_id),
            unit: Set(input.unit),
            unit_cost: Set(input.unit_cost),
            quantity_on_hand: Set(0),
            reorder_level: Set(input.reorder_level),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> Result<items::Model, ServiceError> {
        items::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", id)))
    }

    /// Item detail with its stock batches, newest first.
    #[instrument(skip(self))]
    pub async fn get_item_with_batches(
        &self,
        id: Uuid,
    ) -> Result<(items::Model, Vec<stock_batches::Model>), ServiceError> {
        let item = self.get_item(id).await?;
        let batches = stock_batches::Entity::find()
            .filter(stock_batches::Column::ItemId.eq(id))
            .order_by_desc(stock_batches::Column::ReceivedAt)
            .all(&*self.db)
            .await?;
        Ok((item, batches))
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<items::Model>, u64), ServiceError> {
        let mut query = items::Entity::find();

        if let Some(term) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(items::Column::Name.contains(&term))
                    .add(items::Column::Sku.contains(&term)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(items::Column::CategoryId.eq(category_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(items::Column::SupplierId.eq(supplier_id));
        }
        if filter.low_stock.unwrap_or(false) {
            use sea_orm::sea_query::Expr;
            query = query.filter(
                Expr::col(items::Column::QuantityOnHand).lte(Expr::col(items::Column::ReorderLevel)),
            );
        }
        if !filter.include_inactive.unwrap_or(false) {
            query = query.filter(items::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_asc(items::Column::Name)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        id: Uuid,
        input: ItemInput,
    ) -> Result<items::Model, ServiceError> {
        if input.unit_cost < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "unit_cost cannot be negative".into(),
            ));
        }

        let existing = self.get_item(id).await?;

        let clash = items::Entity::find()
            .filter(items::Column::Sku.eq(input.sku.clone()))
            .filter(items::Column::Id.ne(id))
            .one(&*self.db)
            .await?;
        if clash.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU '{}' already exists",
                input.sku
            )));
        }

        self.check_references(input.category_id, input.supplier_id)
            .await?;

        let mut model: items::ActiveModel = existing.into();
        model.sku = Set(input.sku);
        model.name = Set(input.name);
        model.description = Set(input.description);
        model.category_id = Set(input.category_id);
        model.supplier_id = Set(input.supplier_id);
        model.unit = Set(input.unit);
        model.unit_cost = Set(input.unit_cost);
        model.reorder_level = Set(input.reorder_level);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Deactivates an item; stock history keeps referencing it.
    #[instrument(skip(self))]
    pub async fn deactivate_item(&self, id: Uuid) -> Result<items::Model, ServiceError> {
        let existing = self.get_item(id).await?;
        let mut model: items::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    async fn check_references(
        &self,
        category_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if let Some(category_id) = category_id {
            let found = categories::Entity::find_by_id(category_id)
                .one(&*self.db)
                .await?;
            if found.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Category {} does not exist",
                    category_id
                )));
            }
        }
        if let Some(supplier_id) = supplier_id {
            let found = suppliers::Entity::find_by_id(supplier_id)
                .one(&*self.db)
                .await?;
            if found.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Supplier {} does not exist",
                    supplier_id
                )));
            }
        }
        Ok(())
    }
}
