use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Files)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Owner listings filter on (owner_id, is_deleted) for every read
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_files_owner_id")
                    .table(Files)
                    .col(crate::entities::files::Column::OwnerId)
                    .col(crate::entities::files::Column::IsDeleted)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Files).to_owned())
            .await?;

        Ok(())
    }
}
