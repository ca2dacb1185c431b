use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A committed order.
///
/// Created exactly once per successful checkout, inside the same transaction
/// as its items, the inventory decrements and the cart clear. `amount` equals
/// the order summary total at purchase time. `is_paid` is false only for
/// payment methods that defer settlement (cash on delivery).
///
/// `idempotency_key` is the client-supplied retry token; the unique index on
/// it lets a replayed checkout find the original order instead of charging
/// and decrementing twice.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub payment_type: String,
    pub amount: i64,
    pub is_paid: bool,
    pub payment_reference: String,
    #[sea_orm(unique)]
    pub idempotency_key: Option<String>,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
