use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{entities::suppliers, errors::ServiceError};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_supplier(
        &self,
        input: SupplierInput,
    ) -> Result<suppliers::Model, ServiceError> {
        let now = Utc::now();
        let model = suppliers::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact_name: Set(input.contact_name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: Uuid) -> Result<suppliers::Model, ServiceError> {
        suppliers::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    /// Lists suppliers, optionally filtered by name substring.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        search: Option<String>,
        include_inactive: bool,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<suppliers::Model>, u64), ServiceError> {
        let mut query = suppliers::Entity::find();
        if let Some(term) = search {
            query = query.filter(suppliers::Column::Name.contains(&term));
        }
        if !include_inactive {
            query = query.filter(suppliers::Column::IsActive.eq(true));
        }
        let paginator = query
            .order_by_asc(suppliers::Column::Name)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        input: SupplierInput,
    ) -> Result<suppliers::Model, ServiceError> {
        let existing = self.get_supplier(id).await?;
        let mut model: suppliers::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.contact_name = Set(input.contact_name);
        model.email = Set(input.email);
        model.phone = Set(input.phone);
        model.address = Set(input.address);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Deactivates a supplier instead of deleting it, so historical purchase
    /// orders and deliveries keep a valid reference.
    #[instrument(skip(self))]
    pub async fn deactivate_supplier(&self, id: Uuid) -> Result<suppliers::Model, ServiceError> {
        let existing = self.get_supplier(id).await?;
        let mut model: suppliers::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }
}
