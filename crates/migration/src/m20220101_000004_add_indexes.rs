use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Account: login looks up by (email, is_active)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_email_active")
                    .table(Account::Table)
                    .col(Account::Email)
                    .col(Account::IsActive)
                    .to_owned(),
            )
            .await?;

        // RefreshToken: index on account_id
        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_token_account")
                    .table(RefreshToken::Table)
                    .col(RefreshToken::AccountId)
                    .to_owned(),
            )
            .await?;

        // RefreshToken: expiry, for housekeeping of stale rows
        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_token_expires_at")
                    .table(RefreshToken::Table)
                    .col(RefreshToken::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_refresh_token_expires_at").table(RefreshToken::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_refresh_token_account").table(RefreshToken::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_account_email_active").table(Account::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Account { Table, Email, IsActive }

#[derive(DeriveIden)]
enum RefreshToken { Table, AccountId, ExpiresAt }
