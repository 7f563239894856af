use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Email of the seeded administrator account.
pub const SEED_ADMIN_EMAIL: &str = "admin@dokarr.local";

/// Hash the seed admin password using Argon2id
fn hash_seed_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"admin123";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash seed admin password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // manager_id is hit by the assignment check on every manager read
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_manager_id")
                    .table(Users)
                    .col(crate::entities::users::Column::ManagerId)
                    .to_owned(),
            )
            .await?;

        // Seed administrator so a fresh instance is reachable
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_seed_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Name,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::IsActive,
                crate::entities::users::Column::Credits,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                SEED_ADMIN_EMAIL.into(),
                password_hash.into(),
                "admin".into(),
                true.into(),
                crate::constants::accounts::DEFAULT_CREDITS.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
