use dyntab::{
    error::Error, record, CreateTableRequest, FieldDefinition, FieldType, FieldValue, Record,
    TableOptions,
};
use dyntab_test::{run_test, tasks_request};

#[tokio::test]
async fn test_type_mismatch_inserts_nothing() {
    run_test(|svc| async move {
        svc.create_table(tasks_request("tasks", TableOptions::default()))
            .await
            .unwrap();
        let repo = svc.get_repository("tasks").await.unwrap();

        match repo
            .create(record! { "title" => "bad", "priority" => "high" })
            .await
        {
            Err(Error::Validation(m)) => {
                assert_eq!(m, "field 'priority' expects int, got string")
            }
            other => panic!("expect validation error, got {:?}", other),
        }

        assert_eq!(repo.count(Record::new()).await.unwrap(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_soft_delete_hides_rows() {
    run_test(|svc| async move {
        let options = TableOptions {
            timestamps: false,
            soft_delete: true,
        };
        svc.create_table(tasks_request("tasks", options)).await.unwrap();
        let repo = svc.get_repository("tasks").await.unwrap();

        let a = repo.create(record! { "title" => "a" }).await.unwrap();
        repo.create(record! { "title" => "b" }).await.unwrap();

        repo.delete(a["id"].clone()).await.unwrap();

        assert!(matches!(
            repo.find_by_id(a["id"].clone()).await,
            Err(Error::NotFound(_))
        ));
        let rows = repo.find(Record::new(), None, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], FieldValue::from("b"));
        assert_eq!(repo.count(Record::new()).await.unwrap(), 1);

        let raw = repo
            .execute_raw_query(
                "SELECT * FROM custom_tasks WHERE id = ?",
                vec![a["id"].clone()],
            )
            .await
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert!(matches!(raw[0]["deleted_at"], FieldValue::Time(_)));
    })
    .await;
}

#[tokio::test]
async fn test_raw_query_allow_list() {
    run_test(|svc| async move {
        svc.create_table(tasks_request("foo", TableOptions::default()))
            .await
            .unwrap();
        let repo = svc.get_repository("foo").await.unwrap();
        repo.create(record! { "title" => "one" }).await.unwrap();

        for query in ["DELETE FROM custom_foo", "SELECT * FROM other_table"] {
            assert!(matches!(
                repo.execute_raw_query(query, vec![]).await,
                Err(Error::Validation(_))
            ));
        }

        let rows = repo
            .execute_raw_query("  select * from custom_foo where id = ?", vec![1.into()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], FieldValue::from("one"));
    })
    .await;
}

#[tokio::test]
async fn test_find_update_and_bulk_insert() {
    run_test(|svc| async move {
        svc.create_table(tasks_request("tasks", TableOptions::default()))
            .await
            .unwrap();
        let repo = svc.get_repository("tasks").await.unwrap();

        let rows = repo
            .bulk_insert(vec![
                record! { "title" => "a", "priority" => 1 },
                record! { "title" => "b", "priority" => 2 },
                record! { "title" => "c", "priority" => 2, "tags" => serde_json::json!(["x"]) },
            ])
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);

        let twos = repo
            .find(record! { "priority" => 2 }, Some(10), None)
            .await
            .unwrap();
        let titles: Vec<_> = twos.iter().map(|r| r["title"].to_string()).collect();
        assert_eq!(titles, vec!["b", "c"]);

        let page = repo.find(Record::new(), Some(1), Some(1)).await.unwrap();
        assert_eq!(page[0]["title"], FieldValue::from("b"));

        assert_eq!(
            repo.count(record! { "tags" => FieldValue::Null }).await.unwrap(),
            2
        );

        let updated = repo
            .update(1, record! { "priority" => 5, "id" => 99 })
            .await
            .unwrap();
        assert_eq!(updated["id"], FieldValue::Int(1));
        assert_eq!(updated["priority"], FieldValue::Int(5));

        assert!(matches!(
            repo.update(42, record! { "priority" => 1 }).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            repo.find(record! { "missing" => 1 }, None, None).await,
            Err(Error::Validation(_))
        ));

        // one bad record rejects the whole batch
        let res = repo
            .bulk_insert(vec![
                record! { "title" => "d" },
                record! { "title" => "e", "priority" => -1 },
            ])
            .await;
        assert!(matches!(res, Err(Error::Validation(m)) if m.starts_with("record 1: ")));
        assert_eq!(repo.count(Record::new()).await.unwrap(), 3);

        repo.delete(3).await.unwrap();
        assert!(matches!(repo.delete(3).await, Err(Error::NotFound(_))));
    })
    .await;
}

#[tokio::test]
async fn test_invoices() {
    run_test(|svc| async move {
        let def = svc
            .create_table(CreateTableRequest {
                display_name: "invoices".into(),
                fields: vec![
                    FieldDefinition::new("amount", FieldType::Float).min_value(0.0),
                    FieldDefinition::new("status", FieldType::String)
                        .enum_values(["draft", "sent", "paid"]),
                ],
                options: TableOptions {
                    timestamps: true,
                    soft_delete: false,
                },
                created_by: "billing".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(def.name, "custom_invoices");

        let repo = svc.get_repository("invoices").await.unwrap();

        let created = repo
            .create(record! { "amount" => 10.5, "status" => "draft" })
            .await
            .unwrap();
        assert!(matches!(created["created_at"], FieldValue::Time(_)));
        assert!(matches!(created["updated_at"], FieldValue::Time(_)));

        match repo
            .create(record! { "amount" => -5.0, "status" => "draft" })
            .await
        {
            Err(Error::Validation(m)) => assert_eq!(m, "field 'amount' must be at least 0"),
            other => panic!("expect min value error, got {:?}", other),
        }

        match repo
            .create(record! { "amount" => 10, "status" => "void" })
            .await
        {
            Err(Error::Validation(m)) => {
                assert_eq!(m, "field 'status' must be one of [draft, sent, paid]")
            }
            other => panic!("expect enum error, got {:?}", other),
        }

        assert_eq!(repo.count(Record::new()).await.unwrap(), 1);
    })
    .await;
}
