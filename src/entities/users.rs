use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Stored lowercase; lookups normalize before comparing.
    #[sea_orm(unique)]
    pub email: String,

    pub phone: Option<String>,

    /// Argon2id password hash. Absent for accounts created before a password
    /// was set (login then points at password recovery).
    pub password_hash: Option<String>,

    /// One of the closed role set, see [`crate::domain::Role`].
    pub role: String,

    pub is_active: bool,

    /// Assigned personal manager. Meaningful only for client accounts; must
    /// reference a manager or admin.
    pub manager_id: Option<i32>,

    /// Entitlement counter, never negative. Mutated only through the credit
    /// ledger endpoint.
    pub credits: i32,

    /// Single active password-reset token with its expiry; cleared on use.
    pub password_reset_token: Option<String>,

    pub password_reset_expires: Option<String>,

    pub last_login: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::files::Entity")]
    Files,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ManagerId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Manager,
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
