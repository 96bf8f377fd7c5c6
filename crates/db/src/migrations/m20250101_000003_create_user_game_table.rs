//! Create `user_game` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserGame::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserGame::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserGame::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserGame::GameName).string_len(255).not_null())
                    .col(ColumnDef::new(UserGame::GameUsername).string_len(255))
                    .col(ColumnDef::new(UserGame::GameId).string_len(255))
                    .col(
                        ColumnDef::new(UserGame::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_game_user")
                            .from(UserGame::Table, UserGame::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, game_name) - a game is connected at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_user_game_user_game_name")
                    .table(UserGame::Table)
                    .col(UserGame::UserId)
                    .col(UserGame::GameName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserGame::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserGame {
    Table,
    Id,
    UserId,
    GameName,
    GameUsername,
    GameId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
