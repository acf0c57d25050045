//! Create `account` table.
//!
//! Email is unique and compared byte-for-byte; the password column only ever
//! holds a PHC hash string.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::Email, 255).unique_key().not_null())
                    .col(string_len(Account::PasswordHash, 255).not_null())
                    .col(string_len(Account::FirstName, 128).not_null())
                    .col(string_len(Account::LastName, 128).not_null())
                    .col(string_len(Account::Phone, 32).not_null())
                    .col(string_len(Account::Role, 16).not_null().default("customer"))
                    .col(boolean(Account::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Account::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Account::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Account::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Account { Table, Id, Email, PasswordHash, FirstName, LastName, Phone, Role, IsActive, CreatedAt, UpdatedAt }
