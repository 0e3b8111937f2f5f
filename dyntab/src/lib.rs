mod config;
mod definition;
mod executor;
mod migration;
mod policy;
mod repository;
mod saga;
mod schema;
mod service;
mod store;
mod validator;
#[macro_use]
mod value;

pub use async_trait::async_trait;
pub use dyntab_conn as conn;
pub use dyntab_error as error;
pub use dyntab_query as query;

pub use config::ServiceConfig;
pub use definition::{
    AlterTableRequest, CreateTableRequest, FieldDefinition, FieldType, FieldValidation,
    ForeignKey, IndexDefinition, TableDefinition, TableOptions, TableStatus,
};
pub use executor::{ConnDdlExecutor, DdlExecutor};
pub use migration::{Migration, MigrationStatus, MigrationType};
pub use policy::NamingPolicy;
pub use repository::DynamicRepository;
pub use saga::{Compensation, Saga};
pub use service::CustomTablesService;
pub use store::{DefinitionStore, SqlDefinitionStore};
pub use validator::validate_field_value;
pub use value::{record_from_json, FieldValue, Record};
