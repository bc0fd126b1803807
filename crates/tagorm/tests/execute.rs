//! Live-database tests. Skipped unless `DATABASE_URL` is set (a `.env` file works too).

#![cfg(feature = "derive")]

use tagorm::{
    Config, Cond, Dialect, FromRow, OrmError, OrmResult, Query, Record, ResultKey, Table,
};
use tokio_postgres::{Client, NoTls};

#[derive(Table, FromRow, Debug, PartialEq)]
#[orm(table = "tagorm_exec_item")]
struct ExecItem {
    #[orm(column = "id")]
    id: i64,
    #[orm(column = "name")]
    name: String,
    #[orm(column = "user_id")]
    user_id: Option<i64>,
}

/// Name and owner only, read by position.
#[derive(FromRow, Debug, PartialEq)]
struct NameOwner {
    #[orm(column = "label")]
    label: String,
    #[orm(column = "owner")]
    owner: Option<i64>,
}

async fn try_connect(test: &str) -> OrmResult<Option<Client>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .batch_execute(
            "CREATE TEMP TABLE tagorm_exec_item (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                user_id BIGINT
            )",
        )
        .await?;
    Ok(Some(client))
}

async fn seed(client: &Client, item: &Table<ExecItem>) -> OrmResult<u64> {
    Query::new(Dialect::Postgres)
        .table(item)
        .values_columns([item.name, item.user_id])
        .values(("apple", 1_i64))
        .values(("banana", 1_i64))
        .values(("cherry", None::<i64>))
        .insert(client)
        .await
}

#[tokio::test]
async fn insert_select_update_delete() -> OrmResult<()> {
    let Some(client) = try_connect("insert_select_update_delete").await? else {
        return Ok(());
    };
    let item = ExecItem::table();

    assert_eq!(seed(&client, &item).await?, 3);

    let rows: Vec<ExecItem> = Query::new(Dialect::Postgres)
        .table(&item)
        .select_all(&item)
        .where_and(Cond::like(item.name, "%an%"))
        .order_by_asc(item.id)
        .fetch_all(&client)
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "banana");

    let updated = Query::new(Dialect::Postgres)
        .table(&item)
        .set(item.user_id, 2_i64)
        .where_and(Cond::is_null(item.user_id))
        .update(&client)
        .await?;
    assert_eq!(updated, 1);

    let deleted = Query::new(Dialect::Postgres)
        .table(&item)
        .where_and(Cond::in_list(item.name, vec!["apple", "cherry"]))
        .delete(&client)
        .await?;
    assert_eq!(deleted, 2);

    let remaining = Query::new(Dialect::Postgres)
        .table(&item)
        .count(&client)
        .await?;
    assert_eq!(remaining, 1);
    Ok(())
}

#[tokio::test]
async fn grouped_counts() -> OrmResult<()> {
    let Some(client) = try_connect("grouped_counts").await? else {
        return Ok(());
    };
    let item = ExecItem::table();
    seed(&client, &item).await?;

    let mut counts = Query::new(Dialect::Postgres)
        .table(&item)
        .where_and(Cond::is_not_null(item.user_id))
        .group_by(item.user_id)
        .count_rows(&client)
        .await?;
    counts.sort();
    assert_eq!(counts, vec![2]);

    let none = Query::new(Dialect::Postgres)
        .table(&item)
        .where_and(Cond::gt(item.id, 1000_i64))
        .group_by(item.user_id)
        .count(&client)
        .await?;
    assert_eq!(none, 0);
    Ok(())
}

#[tokio::test]
async fn maps_use_configured_keys() -> OrmResult<()> {
    let Some(client) = try_connect("maps_use_configured_keys").await? else {
        return Ok(());
    };
    let item = ExecItem::table();
    seed(&client, &item).await?;

    let config = Config::new(Dialect::Postgres).result_key(ResultKey::CamelCase);
    let maps = Query::with_config(config)
        .table(&item)
        .select(item.name)
        .select(item.user_id)
        .where_and(Cond::is(item.name, "cherry"))
        .fetch_maps(&client)
        .await?;

    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0]["name"], serde_json::json!("cherry"));
    assert_eq!(maps[0]["userId"], serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn positional_mapping_is_opt_in() -> OrmResult<()> {
    let Some(client) = try_connect("positional_mapping_is_opt_in").await? else {
        return Ok(());
    };
    let item = ExecItem::table();
    seed(&client, &item).await?;

    let q = Query::new(Dialect::Postgres)
        .table(&item)
        .select(item.name)
        .select(item.user_id)
        .order_by_asc(item.id)
        .limit(1);

    // column names differ from the struct's, so only positional mapping works
    let rows: Vec<NameOwner> = q.fetch_positional(&client).await?;
    assert_eq!(
        rows,
        vec![NameOwner {
            label: "apple".to_string(),
            owner: Some(1),
        }]
    );
    assert!(matches!(
        q.fetch_all::<NameOwner>(&client).await,
        Err(OrmError::Decode { .. })
    ));

    let wide = q.clone().select(item.id);
    assert!(matches!(
        wide.fetch_positional::<NameOwner>(&client).await,
        Err(OrmError::ArityMismatch { expected: 2, got: 3 })
    ));
    Ok(())
}

#[tokio::test]
async fn runs_inside_a_transaction() -> OrmResult<()> {
    let Some(mut client) = try_connect("runs_inside_a_transaction").await? else {
        return Ok(());
    };
    let item = ExecItem::table();

    let tx = client.transaction().await?;
    Query::new(Dialect::Postgres)
        .table(&item)
        .values_columns([item.name])
        .values(("inside",))
        .insert(&tx)
        .await?;
    let seen = Query::new(Dialect::Postgres).table(&item).count(&tx).await?;
    assert_eq!(seen, 1);
    tx.rollback().await?;

    let after = Query::new(Dialect::Postgres)
        .table(&item)
        .count(&client)
        .await?;
    assert_eq!(after, 0);
    Ok(())
}

#[tokio::test]
async fn raw_helpers_share_the_client() -> OrmResult<()> {
    let Some(client) = try_connect("raw_helpers_share_the_client").await? else {
        return Ok(());
    };
    let item = ExecItem::table();
    let q = Query::new(Dialect::Postgres);

    let inserted = q
        .exec(
            &client,
            "INSERT INTO tagorm_exec_item (name, user_id) VALUES ($1, $2)",
            &[&"raw", &5_i64],
        )
        .await?;
    assert_eq!(inserted, 1);

    let rows: Vec<ExecItem> = q
        .exec_query(&client, "SELECT id, name, user_id FROM tagorm_exec_item", &[])
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, Some(5));

    let missing = Query::new(Dialect::Postgres)
        .table(&item)
        .select_all(&item)
        .where_and(Cond::is(item.id, -1_i64))
        .fetch_all::<ExecItem>(&client)
        .await?;
    assert!(missing.is_empty());
    Ok(())
}

#[tokio::test]
async fn maps_decode_numeric_and_name_unsupported_types() -> OrmResult<()> {
    let Some(client) = try_connect("maps_decode_numeric_and_name_unsupported_types").await? else {
        return Ok(());
    };
    let item = ExecItem::table();
    seed(&client, &item).await?;

    // sum(bigint) comes back as NUMERIC
    let maps = Query::new(Dialect::Postgres)
        .table(&item)
        .select_format_as("sum(%s)", item.user_id, "total")
        .select_raw_as("1.50::numeric", "price")
        .fetch_maps(&client)
        .await?;
    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0]["total"], serde_json::json!("2"));
    assert_eq!(maps[0]["price"], serde_json::json!("1.50"));

    let err = Query::new(Dialect::Postgres)
        .table(&item)
        .select_raw_as("interval '1 day'", "span")
        .limit(1)
        .fetch_maps(&client)
        .await
        .unwrap_err();
    match err {
        OrmError::Decode { column, message } => {
            assert_eq!(column, "span");
            assert!(message.contains("interval"), "{message}");
        }
        other => panic!("expected a decode error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn mysql_builders_are_not_sent_to_postgres() -> OrmResult<()> {
    let Some(client) = try_connect("mysql_builders_are_not_sent_to_postgres").await? else {
        return Ok(());
    };
    let item = ExecItem::table();

    let err = Query::new(Dialect::Mysql)
        .table(&item)
        .values_columns([item.name])
        .values(("never",))
        .insert(&client)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));

    let count = Query::new(Dialect::Postgres)
        .table(&item)
        .count(&client)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}
