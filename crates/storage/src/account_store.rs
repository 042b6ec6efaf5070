use carmarket_domain::model::{AccountRecord, EmailAddress, NewAccount};
use carmarket_domain::storage::{AccountStore, CreateOutcome, StorageError, StorageResult};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::entity::accounts;
use crate::retry::with_retry;
use crate::MarketStorage;

#[async_trait::async_trait]
impl AccountStore for MarketStorage {
    async fn find_account(&self, email: &EmailAddress) -> StorageResult<Option<AccountRecord>> {
        let maybe = with_retry(self.retry(), "find_account", || {
            accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.as_str()))
                .one(self.connection())
        })
        .await?;
        maybe.map(account_to_record).transpose()
    }

    async fn create_account(&self, account: NewAccount) -> StorageResult<CreateOutcome> {
        let rows = with_retry(self.retry(), "create_account", || {
            let model = accounts::ActiveModel {
                email: Set(account.email.as_str().to_string()),
                display_name: Set(account.display_name.clone()),
                phone: Set(account.phone.clone()),
                password_hash: Set(account.password_hash.clone()),
                is_admin: Set(account.is_admin),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            accounts::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(accounts::Column::Email)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(self.connection())
        })
        .await?;

        Ok(if rows == 0 {
            CreateOutcome::AlreadyExists
        } else {
            CreateOutcome::Created
        })
    }

    async fn count_accounts(&self) -> StorageResult<u64> {
        with_retry(self.retry(), "count_accounts", || {
            accounts::Entity::find().count(self.connection())
        })
        .await
    }
}

fn account_to_record(model: accounts::Model) -> StorageResult<AccountRecord> {
    let email = EmailAddress::parse(&model.email)
        .map_err(|err| StorageError::Database(err.to_string()))?;

    Ok(AccountRecord {
        email,
        display_name: model.display_name,
        phone: model.phone,
        password_hash: model.password_hash,
        is_admin: model.is_admin,
        created_at: model.created_at,
    })
}
