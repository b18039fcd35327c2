//! Create saved_event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedEvent::UserId).integer().not_null())
                    .col(ColumnDef::new(SavedEvent::EventId).integer().not_null())
                    .col(
                        ColumnDef::new(SavedEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_event_user")
                            .from(SavedEvent::Table, SavedEvent::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_event_event")
                            .from(SavedEvent::Table, SavedEvent::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, event_id) - one save per user per event
        manager
            .create_index(
                Index::create()
                    .name("idx_saved_event_user_event")
                    .table(SavedEvent::Table)
                    .col(SavedEvent::UserId)
                    .col(SavedEvent::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for listing subscribers of an event)
        manager
            .create_index(
                Index::create()
                    .name("idx_saved_event_event_id")
                    .table(SavedEvent::Table)
                    .col(SavedEvent::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavedEvent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SavedEvent {
    Table,
    Id,
    UserId,
    EventId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}
