use dyntab::{
    error::Error, AlterTableRequest, FieldDefinition, FieldType, MigrationStatus, MigrationType,
    TableDefinition, TableOptions,
};
use dyntab_test::{run_test, tasks_request};

#[tokio::test]
async fn test_history_versions() {
    run_test(|svc| async move {
        let def = svc
            .create_table(tasks_request("tasks", TableOptions::default()))
            .await
            .unwrap();

        let mut fields = def.fields.clone();
        for name in ["notes", "owner", "estimate"] {
            fields.push(FieldDefinition::new(name, FieldType::Text).nullable());
            svc.alter_table(
                "tasks",
                AlterTableRequest {
                    fields: fields.clone(),
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap();
        }

        svc.drop_table("tasks", false, "cleaner").await.unwrap();

        let history = svc.get_migration_history("tasks").await.unwrap();
        let versions: Vec<_> = history.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);

        let kinds: Vec<_> = history.iter().map(|m| m.migration_type).collect();
        assert_eq!(
            kinds,
            vec![
                MigrationType::Create,
                MigrationType::Alter,
                MigrationType::Alter,
                MigrationType::Alter,
                MigrationType::Drop,
            ]
        );
        assert!(history
            .iter()
            .all(|m| m.status == MigrationStatus::Completed && m.table_id == def.id));

        assert!(history[0].old_schema.is_none());
        let created: TableDefinition =
            serde_json::from_str(history[0].new_schema.as_deref().unwrap()).unwrap();
        assert_eq!(created.fields, def.fields);

        let dropped = &history[4];
        assert_eq!(dropped.executed_by, "cleaner");
        let archived: TableDefinition =
            serde_json::from_str(dropped.new_schema.as_deref().unwrap()).unwrap();
        assert!(!archived.is_active());
    })
    .await;
}

#[tokio::test]
async fn test_alter_archived_table() {
    run_test(|svc| async move {
        svc.create_table(tasks_request("tasks", TableOptions::default()))
            .await
            .unwrap();
        svc.drop_table("tasks", false, "tester").await.unwrap();

        let res = svc
            .alter_table("tasks", AlterTableRequest::default(), "tester")
            .await;
        assert!(matches!(res, Err(Error::State(_))));

        // a failed request leaves no migration behind
        assert_eq!(svc.get_migration_history("tasks").await.unwrap().len(), 2);

        assert!(matches!(
            svc.get_migration_history("missing").await,
            Err(Error::NotFound(_))
        ));
    })
    .await;
}

#[tokio::test]
async fn test_alter_rejects_invalid_definition() {
    run_test(|svc| async move {
        let def = svc
            .create_table(tasks_request("tasks", TableOptions::default()))
            .await
            .unwrap();

        let mut fields = def.fields.clone();
        fields.push(FieldDefinition::new("title", FieldType::Text));

        let res = svc
            .alter_table(
                "tasks",
                AlterTableRequest {
                    fields,
                    ..Default::default()
                },
                "tester",
            )
            .await;
        match res {
            Err(Error::Validation(m)) => assert_eq!(m, "duplicate field name 'title'"),
            other => panic!("expect validation error, got {:?}", other),
        }

        assert_eq!(svc.get_table("tasks").await.unwrap().fields, def.fields);
        assert_eq!(svc.get_migration_history("tasks").await.unwrap().len(), 1);
    })
    .await;
}
