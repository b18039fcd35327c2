//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::TelegramId).big_integer().not_null())
                    .col(ColumnDef::new(User::Username).string_len(256))
                    .col(
                        ColumnDef::new(User::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(User::LastActiveAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: telegram_id - one row per Telegram account, and the
        // guard against concurrent first-contact creating duplicates
        manager
            .create_index(
                Index::create()
                    .name("idx_user_telegram_id")
                    .table(User::Table)
                    .col(User::TelegramId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: last_active_at (for the admin activity listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_last_active_at")
                    .table(User::Table)
                    .col(User::LastActiveAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    TelegramId,
    Username,
    IsAdmin,
    CreatedAt,
    LastActiveAt,
}
