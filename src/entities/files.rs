use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored (on-disk) filename, a UUID with the original extension.
    pub filename: String,

    pub original_name: String,

    pub mime_type: String,

    pub size: i64,

    /// Opaque path into the blob store. Never exposed through the API.
    pub path: String,

    pub owner_id: i32,

    pub description: Option<String>,

    /// Soft-delete flag. Every read in the catalog filters on it.
    pub is_deleted: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
