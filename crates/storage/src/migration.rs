use sea_orm::sea_query::{ColumnDef, Expr, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};

use carmarket_domain::storage::{StorageError, StorageResult};

use crate::entity::accounts;

pub async fn run_migrations(db: &DatabaseConnection) -> StorageResult<()> {
    let backend = db.get_database_backend();

    // The unique email column is the safety net that keeps concurrent
    // startup seeding from ever producing two bootstrap accounts.
    let accounts_table = Table::create()
        .if_not_exists()
        .table(accounts::Entity)
        .col(
            ColumnDef::new(accounts::Column::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(accounts::Column::Email)
                .string_len(254)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(accounts::Column::DisplayName)
                .string_len(128)
                .not_null(),
        )
        .col(ColumnDef::new(accounts::Column::Phone).string_len(32).null())
        .col(
            ColumnDef::new(accounts::Column::PasswordHash)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(accounts::Column::IsAdmin)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(accounts::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned();
    create_table(db, backend, accounts_table).await
}

async fn create_table(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: TableCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}
