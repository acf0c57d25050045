use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, ColumnTrait, QueryFilter, ActiveModelTrait, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    #[sea_orm(column_type = "Text", unique)]
    pub token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::account::Entity",
        from = "Column::AccountId",
        to = "crate::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<crate::account::Entity> for Entity {
    fn to() -> RelationDef { Relation::Account.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    account_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<Model, ModelError> {
    if token.trim().is_empty() {
        return Err(ModelError::Validation("token required".into()));
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        token: Set(token.to_string()),
        expires_at: Set(expires_at.into()),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

/// Row matching `token` whose expiry is still in the future.
pub async fn find_valid(db: &DatabaseConnection, token: &str) -> Result<Option<Model>, ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    Ok(Entity::find()
        .filter(Column::Token.eq(token))
        .filter(Column::ExpiresAt.gt(now))
        .one(db)
        .await?)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Uuid) -> Result<u64, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn delete_by_token(db: &DatabaseConnection, token: &str) -> Result<u64, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
