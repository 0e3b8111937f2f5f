mod ddl;
mod delete;
mod dialect;
#[macro_use]
mod filter;
mod info;
mod insert;
mod select;
mod update;
mod value;
#[macro_use]
mod where_cond;

pub use ddl::{
    column_def, AlterTableBuilder, CreateIndexBuilder, CreateTableBuilder, DropIndexBuilder,
    DropTableBuilder,
};
pub use delete::DeleteBuilder;
pub use dialect::{quote_literal, Dialect, DialectKind, Postgres, Sqlite};
pub use filter::Filter;
pub use info::{ColumnInfo, ColumnType, ForeignKeyInfo, IndexInfo, TableInfo};
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
pub use value::{param, sql_str, QueryValue};
pub use where_cond::Where;

#[derive(Debug)]
pub struct QueryBuilder {}

impl QueryBuilder {
    pub fn select<S: ToString>(table: S) -> SelectBuilder {
        SelectBuilder::new(table)
    }

    pub fn insert<S: ToString>(table: S) -> InsertBuilder {
        InsertBuilder::new(table)
    }

    pub fn update<S: ToString>(table: S) -> UpdateBuilder {
        UpdateBuilder::new(table)
    }

    pub fn delete<S: ToString>(table: S) -> DeleteBuilder {
        DeleteBuilder::new(table)
    }

    pub fn create_table(info: &TableInfo) -> CreateTableBuilder<'_> {
        CreateTableBuilder::new(info)
    }

    pub fn create_index<'a>(table: &'a str, index: &'a IndexInfo) -> CreateIndexBuilder<'a> {
        CreateIndexBuilder::new(table, index)
    }

    pub fn alter_table<S: ToString>(table: S) -> AlterTableBuilder {
        AlterTableBuilder::new(table)
    }

    pub fn drop_table<S: ToString>(table: S) -> DropTableBuilder {
        DropTableBuilder::new(table)
    }

    pub fn drop_index<S: ToString>(index: S) -> DropIndexBuilder {
        DropIndexBuilder::new(index)
    }
}
