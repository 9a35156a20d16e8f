use sea_orm::entity::prelude::*;

/// A ticketed event. `max_attendees` caps tickets sold across all batches.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub max_attendees: Option<i32>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_batches::Entity")]
    TicketBatches,
}

impl Related<super::ticket_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
