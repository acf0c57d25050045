//! Create `refresh_token` table with FK to `account`.
//!
//! One row per issued refresh token; the row is the authority for whether the
//! token may still be exchanged.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RefreshToken::Table)
                    .if_not_exists()
                    .col(uuid(RefreshToken::Id).primary_key())
                    .col(uuid(RefreshToken::AccountId).not_null())
                    .col(text(RefreshToken::Token).unique_key().not_null())
                    .col(timestamp_with_time_zone(RefreshToken::ExpiresAt).not_null())
                    .col(timestamp_with_time_zone(RefreshToken::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refresh_token_account")
                            .from(RefreshToken::Table, RefreshToken::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RefreshToken::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum RefreshToken { Table, Id, AccountId, Token, ExpiresAt, CreatedAt }

#[derive(DeriveIden)]
enum Account { Table, Id }
