pub use sea_orm_migration::prelude::*;

mod m20191008_000001_create_movie;
mod m20191008_000002_create_comment;
mod m20191010_000001_add_comment_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20191008_000001_create_movie::Migration),
            Box::new(m20191008_000002_create_comment::Migration),
            Box::new(m20191010_000001_add_comment_indexes::Migration),
        ]
    }
}
