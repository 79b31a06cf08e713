use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotation_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub request_item_id: Uuid,
    pub unit_price: Decimal,
    /// unit_price x request item quantity, computed server-side.
    pub subtotal: Decimal,
    pub has_invoice: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    pub has_warranty: bool,
    pub warranty_months: Option<i32>,
    /// Winning bid marker. At most one selected item per request item,
    /// enforced by the selection transaction.
    pub is_selected: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quotation::Entity",
        from = "Column::QuotationId",
        to = "super::quotation::Column::Id",
        on_delete = "Cascade"
    )]
    Quotation,
    #[sea_orm(
        belongs_to = "super::request_item::Entity",
        from = "Column::RequestItemId",
        to = "super::request_item::Column::Id",
        on_delete = "Cascade"
    )]
    RequestItem,
}

impl Related<super::quotation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotation.def()
    }
}

impl Related<super::request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
