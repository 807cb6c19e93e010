//! Integration tests for the SeaORM-backed repository against in-memory SQLite

mod common;

use anyhow::Result;
use common::{ContactInfo, User};
use entity_mapper::{
    Config, DbValue, Dialect, EntityMapper, ForeignKeyRepository, RelationField,
    RelationshipRegistry, RelationshipResolver, SeaOrmForeignKeyRepository, TypeMapperRegistry,
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;

mod contact_info {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "contact_info")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub user_id: Option<i64>,
        pub kind: String,
        pub detail: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

type ContactRepo = SeaOrmForeignKeyRepository<contact_info::Entity, ContactInfo>;

fn sqlite_mem_dsn(tag: &str) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!("sqlite:file:entity_mapper_{tag}_{now}?mode=memory&cache=shared")
}

async fn setup_db(tag: &str) -> Result<Arc<DatabaseConnection>> {
    let db = Database::connect(sqlite_mem_dsn(tag)).await?;
    db.execute_unprepared(
        r#"CREATE TABLE contact_info (
                id INTEGER PRIMARY KEY NOT NULL,
                user_id INTEGER NULL,
                kind TEXT NOT NULL,
                detail TEXT NOT NULL
            )"#,
    )
    .await?;
    db.execute_unprepared(
        r#"INSERT INTO contact_info (id, user_id, kind, detail) VALUES
                (3, 42, 'phone', '+44 20 7946 0000'),
                (1, 42, 'email', 'ada@example.com'),
                (2, 7, 'email', 'bob@example.com'),
                (4, NULL, 'email', 'orphan@example.com')"#,
    )
    .await?;
    Ok(Arc::new(db))
}

fn repository(db: Arc<DatabaseConnection>) -> ContactRepo {
    let mapper = EntityMapper::new(
        TypeMapperRegistry::with_builtins(&Config::default()).unwrap(),
        Some(Dialect::Sqlite),
    );
    SeaOrmForeignKeyRepository::new(db, mapper).ordered_by("id")
}

#[tokio::test]
async fn test_lookup_maps_rows_through_entity_mapper() -> Result<()> {
    let repo = repository(setup_db("lookup").await?);
    assert_eq!(repo.name(), "contact_info");

    let contacts = repo.find_by_foreign_key("user_id", &DbValue::I64(42)).await?;

    assert_eq!(
        contacts,
        vec![
            ContactInfo::new(1, 42, "email", "ada@example.com"),
            ContactInfo::new(3, 42, "phone", "+44 20 7946 0000"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_lookup_without_matches_is_empty() -> Result<()> {
    let repo = repository(setup_db("empty").await?);
    let contacts = repo.find_by_foreign_key("user_id", &DbValue::I64(1000)).await?;
    assert!(contacts.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_column_surfaces_database_error() -> Result<()> {
    let repo = repository(setup_db("unknown_column").await?);
    let result = repo.find_by_foreign_key("owner_id", &DbValue::I64(42)).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_resolver_over_sqlite_repository() -> Result<()> {
    let repo = Arc::new(repository(setup_db("resolver").await?));
    let registry = RelationshipRegistry::builder()
        .has_many::<User, ContactInfo>("contacts", "user_id", repo, |u| &mut u.contacts)?
        .build();
    let resolver = RelationshipResolver::new(Arc::new(registry));

    let mut users = vec![User::new(Some(42), "Ada"), User::new(Some(7), "Bob")];
    resolver.resolve_batch(&mut users).await?;

    let ada: Vec<_> = users[0].contacts.items().iter().map(|c| c.kind.as_str()).collect();
    assert_eq!(ada, ["email", "phone"]);
    assert_eq!(users[1].contacts.items().len(), 1);
    assert_eq!(users[1].contacts.items()[0].detail, "bob@example.com");

    let mut unsaved = User::new(None, "new");
    resolver.resolve(&mut unsaved).await?;
    assert_eq!(unsaved.contacts, RelationField::Resolved(Vec::new()));
    Ok(())
}
