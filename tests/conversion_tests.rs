use jsonrel::{ConversionConfig, Database, Result, SchemaBuilder, SqlType, convert};
use serde_json::{Value, json};
use std::collections::HashMap;

fn names(db: &Database, table: &str) -> Vec<String> {
    let (_, table) = db.find_table(table).expect("table exists");
    table.columns().iter().map(|c| c.name.clone()).collect()
}

fn assert_backfilled(db: &Database) {
    for row in db.rows() {
        assert_eq!(
            row.values().len(),
            row.table().column_count(),
            "row of {} is misaligned",
            row.table().name()
        );
    }
}

fn world() -> Value {
    json!({
        "name": "Earth",
        "population": 8_100_000_000i64,
        "continents": [
            {"name": "Africa", "countries": [{"name": "Kenya"}, {"name": "Ghana", "capital": "Accra"}]},
            {"name": "Europe", "area": 10.18, "countries": [{"name": "France", "capital": "Paris", "eu": true}]},
            {"name": "Antarctica", "countries": []}
        ],
        "moon": {"name": "Luna", "radius_km": 1737},
        "tags": ["blue", "wet", null]
    })
}

#[test]
fn test_single_scalar_object() -> Result<()> {
    let db = convert("root", &json!({"a": 1}), "schema")?;

    assert_eq!(db.tables().len(), 1);
    assert_eq!(db.tables()[0].qualified_name(), "schema.root");
    assert_eq!(names(&db, "root"), vec!["id", "a"]);
    assert_eq!(db.records().len(), 1);
    assert_eq!(
        db.records()[0].values(),
        &[Some("1".to_string()), Some("1".to_string())]
    );
    Ok(())
}

#[test]
fn test_nested_object_becomes_child_table() -> Result<()> {
    let db = convert("root", &json!({"a": {"b": 2}}), "s")?;

    assert_eq!(names(&db, "root"), vec!["id"]);
    assert_eq!(names(&db, "root_a"), vec!["id", "root_id", "b"]);

    let parent = db.rows().find(|r| r.table().name() == "root").unwrap();
    let child = db.rows().find(|r| r.table().name() == "root_a").unwrap();
    assert_eq!(child.get("root_id"), parent.get("id"));
    assert_eq!(child.get("b"), Some("2"));
    Ok(())
}

#[test]
fn test_scalar_array_becomes_value_table() -> Result<()> {
    let db = convert("root", &json!({"items": [1, 2, 3]}), "s")?;

    assert_eq!(names(&db, "root_items"), vec!["id", "root_id", "value"]);
    let (items, _) = db.find_table("root_items").unwrap();
    let rows: Vec<_> = db.records_for(items).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.get("root_id") == Some("1")));
    let values: Vec<_> = rows.iter().map(|r| r.get("value").unwrap()).collect();
    assert_eq!(values, vec!["1", "2", "3"]);
    Ok(())
}

#[test]
fn test_new_key_in_later_sibling_is_backfilled() -> Result<()> {
    let db = convert("root", &json!([{"a": 1}, {"a": 1, "b": 2}]), "s")?;

    assert_eq!(db.tables().len(), 1);
    assert_eq!(names(&db, "root"), vec!["id", "a", "b"]);
    assert_eq!(
        db.records()[0].values(),
        &[Some("1".to_string()), Some("1".to_string()), None]
    );

    let first = db.rows().next().unwrap();
    assert_eq!(first.literal_values_string(), "INSERT INTO s.root VALUES (1, 1, null)");
    assert_backfilled(&db);
    Ok(())
}

#[test]
fn test_widening_integer_to_double_and_varchar_growth() -> Result<()> {
    let db = convert(
        "root",
        &json!([{"n": 1, "s": "ab"}, {"n": 2.5, "s": "abcdef"}]),
        "s",
    )?;
    let (_, table) = db.find_table("root").unwrap();

    assert_eq!(table.get_column("n").unwrap().sql_type, SqlType::Double);
    assert_eq!(table.get_column("s").unwrap().sql_type, SqlType::VarChar(6));
    assert_eq!(table.get_column("s").unwrap().precision(), Some(6));
    Ok(())
}

#[test]
fn test_primary_keys_unique_and_increasing() -> Result<()> {
    let db = convert("world", &world(), "geo")?;

    let mut ids: HashMap<String, Vec<u64>> = HashMap::new();
    for row in db.rows() {
        let id: u64 = row.get("id").unwrap().parse().unwrap();
        ids.entry(row.table().name().to_string()).or_default().push(id);
    }

    for (table, ids) in ids {
        let expected: Vec<u64> = (1..=ids.len() as u64).collect();
        assert_eq!(ids, expected, "keys of {}", table);
    }
    Ok(())
}

#[test]
fn test_deep_document_layout() -> Result<()> {
    let db = convert("world", &world(), "geo")?;
    assert_backfilled(&db);

    let tables: Vec<&str> = db.tables().iter().map(|t| t.name()).collect();
    assert_eq!(
        tables,
        vec![
            "world",
            "world_continents",
            "world_continents_countries",
            "world_moon",
            "world_tags"
        ]
    );

    assert_eq!(names(&db, "world"), vec!["id", "name", "population"]);
    assert_eq!(
        names(&db, "world_continents"),
        vec!["id", "world_id", "name", "area"]
    );
    assert_eq!(
        names(&db, "world_continents_countries"),
        vec!["id", "world_continents_id", "name", "capital", "eu"]
    );

    let (_, world) = db.find_table("world").unwrap();
    assert_eq!(world.get_column("population").unwrap().sql_type, SqlType::BigInt);

    let (countries, _) = db.find_table("world_continents_countries").unwrap();
    let owners: Vec<_> = db
        .records_for(countries)
        .map(|r| r.get("world_continents_id").unwrap().to_string())
        .collect();
    assert_eq!(owners, vec!["1", "1", "2"]);

    let (tags, _) = db.find_table("world_tags").unwrap();
    let tags: Vec<_> = db.records_for(tags).map(|r| r.get("value")).collect();
    assert_eq!(tags, vec![Some("blue"), Some("wet"), None]);
    Ok(())
}

#[test]
fn test_records_are_parent_first() -> Result<()> {
    let db = convert("root", &json!([{"c": {"x": 1}}, {"c": {"x": 2}}]), "s")?;

    let order: Vec<String> = db
        .rows()
        .map(|r| format!("{}:{}", r.table().name(), r.get("id").unwrap()))
        .collect();
    assert_eq!(order, vec!["root:1", "root_c:1", "root:2", "root_c:2"]);
    Ok(())
}

#[test]
fn test_conversion_is_repeatable() -> Result<()> {
    let builder = SchemaBuilder::new();
    let first = builder.convert("world", &world(), "geo")?;
    let second = builder.convert("world", &world(), "geo")?;

    assert_eq!(first, second);
    assert_eq!(first.diagnostic_script(), second.diagnostic_script());
    Ok(())
}

#[test]
fn test_row_order_does_not_change_schema() -> Result<()> {
    let rows = vec![
        json!({"v": 1, "s": "x"}),
        json!({"v": 2.5, "s": "longer"}),
        json!({"v": "text", "w": true}),
        json!({"v": 9_000_000_000i64, "s": null}),
    ];
    let forward = convert("root", &Value::Array(rows.clone()), "s")?;
    let backward = convert("root", &Value::Array(rows.into_iter().rev().collect()), "s")?;

    for column in ["v", "s", "w"] {
        let (_, f) = forward.find_table("root").unwrap();
        let (_, b) = backward.find_table("root").unwrap();
        assert_eq!(
            f.get_column(column).unwrap().sql_type,
            b.get_column(column).unwrap().sql_type,
            "column {}",
            column
        );
    }
    Ok(())
}

#[test]
fn test_ddl_rendering() -> Result<()> {
    let config = ConversionConfig::new().default_value("status", "new");
    let db = SchemaBuilder::with_config(config).convert(
        "orders",
        &json!([{"status": "open", "total": 12.5, "lines": [{"sku": "A-1", "qty": 2}]}]),
        "shop",
    )?;

    assert_eq!(
        db.create_table_queries(),
        vec![
            "CREATE TABLE shop.orders (id INTEGER PRIMARY KEY, status VARCHAR(4) DEFAULT 'new', \
             total DOUBLE PRECISION)"
                .to_string(),
            "CREATE TABLE shop.orders_lines (id INTEGER PRIMARY KEY, \
             orders_id INTEGER REFERENCES shop.orders (id), sku VARCHAR(3), qty INTEGER)"
                .to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_diagnostic_script_groups_by_table() -> Result<()> {
    let db = convert("root", &json!([{"a": 1, "c": [true]}, {"a": 2}]), "s")?;

    assert_eq!(
        db.diagnostic_script(),
        "--- Tables ---\n\
         CREATE TABLE s.root (id INTEGER PRIMARY KEY, a INTEGER)\n\
         CREATE TABLE s.root_c (id INTEGER PRIMARY KEY, root_id INTEGER REFERENCES s.root (id), value BOOLEAN)\n\
         INSERT INTO s.root VALUES (1, 1)\n\
         INSERT INTO s.root VALUES (2, 2)\n\
         INSERT INTO s.root_c VALUES (1, 1, true)"
    );
    Ok(())
}

#[test]
fn test_serializes_to_json() -> Result<()> {
    let db = convert("root", &json!({"a": "x"}), "s")?;
    let value = serde_json::to_value(&db).unwrap();

    assert_eq!(value["schema"], "s");
    assert_eq!(value["tables"][0]["name"], "root");
    assert_eq!(value["tables"][0]["columns"][1]["sql_type"], json!({"VarChar": 1}));
    assert_eq!(value["records"][0]["values"], json!(["1", "x"]));
    Ok(())
}

#[test]
fn test_table_shared_by_two_paths() -> Result<()> {
    // `root.x_y` and `root.x.y` both land in `root_x_y`
    let db = convert("root", &json!({"x_y": {"k": 1}, "x": {"y": {"k": 2}}}), "s")?;

    assert_eq!(names(&db, "root_x_y"), vec!["id", "root_id", "k", "root_x_id"]);
    assert_backfilled(&db);

    let shared: Vec<_> = db.rows().filter(|r| r.table().name() == "root_x_y").collect();
    assert_eq!(shared.len(), 2);
    assert_eq!(shared[0].get("root_id"), Some("1"));
    assert_eq!(shared[0].get("root_x_id"), None);
    assert_eq!(shared[1].get("root_id"), None);
    assert_eq!(shared[1].get("root_x_id"), Some("1"));
    assert_eq!(shared[1].get("k"), Some("2"));

    let tables: Vec<&str> = db.tables().iter().map(|t| t.name()).collect();
    assert_eq!(tables, vec!["root", "root_x", "root_x_y"]);

    let ddl = db.create_table_queries();
    let pos = |name: &str| {
        ddl.iter()
            .position(|q| q.starts_with(&format!("CREATE TABLE s.{} (", name)))
            .expect("table created")
    };
    assert!(pos("root") < pos("root_x"));
    assert!(pos("root_x") < pos("root_x_y"));

    let batches: Vec<String> = db
        .insert_batches()
        .iter()
        .map(|b| b.table.name().to_string())
        .collect();
    assert_eq!(batches, vec!["root", "root_x", "root_x_y"]);
    Ok(())
}
