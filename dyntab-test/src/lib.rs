use std::future::Future;

use dyntab::{
    CreateTableRequest, CustomTablesService, FieldDefinition, FieldType, ServiceConfig,
    TableOptions,
};

pub async fn run_test<Fn, Fut>(f: Fn)
where
    Fn: FnOnce(CustomTablesService) -> Fut,
    Fut: Future<Output = ()>,
{
    env_logger::try_init().ok();

    let service = CustomTablesService::connect(ServiceConfig::default())
        .await
        .unwrap();

    f(service).await;
}

/// Request shared by most tests, a task list with an indexed priority
pub fn tasks_request(name: &str, options: TableOptions) -> CreateTableRequest {
    CreateTableRequest {
        display_name: name.into(),
        description: "things to do".into(),
        fields: vec![
            FieldDefinition::new("title", FieldType::String).max_length(50),
            FieldDefinition::new("priority", FieldType::Int)
                .default_value("0")
                .min_value(0.0)
                .indexed(),
            FieldDefinition::new("tags", FieldType::Json).nullable(),
        ],
        indexes: vec![],
        options,
        created_by: "tester".into(),
    }
}
