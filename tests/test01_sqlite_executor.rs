#![cfg(feature = "sqlite")]

use std::collections::HashSet;

use sqlweb::prelude::*;
use tempfile::TempDir;

fn seeded(db: &Db, rows: i64) -> Result<(), Box<dyn std::error::Error>> {
    db.try_raw_execute(
        "CREATE TABLE item (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, price REAL, active INTEGER);",
    )?;
    for i in 1..=rows {
        db.try_insert(
            "INSERT INTO item (name, price, active) VALUES (?1, ?2, ?3)",
            &Params::positional([
                RowValues::Text(format!("item-{i:02}")),
                RowValues::Float(i as f64 * 1.5),
                RowValues::Bool(i % 2 == 0),
            ]),
        )?;
    }
    Ok(())
}

#[test]
fn select_all_returns_every_matching_row() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 7)?;

    let all = db
        .select_all("SELECT id, name FROM item ORDER BY id", &Params::empty())
        .ok_or("select_all failed")?;
    assert_eq!(all.len(), 7);
    assert_eq!(all.column_names(), ["id", "name"]);

    let active = db
        .select_all("SELECT id FROM item WHERE active = ?1", &Params::positional([true]))
        .ok_or("select_all failed")?;
    assert_eq!(active.len(), 3);

    let none = db
        .select_all("SELECT id FROM item WHERE id > ?1", &Params::positional([100]))
        .ok_or("select_all failed")?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn select_one_returns_first_row_or_none() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 3)?;

    let row = db
        .select_one("SELECT id, name, price FROM item ORDER BY id DESC", &Params::empty())
        .ok_or("expected a row")?;
    assert_eq!(row.get("id"), Some(&RowValues::Int(3)));
    assert_eq!(row.get("name").and_then(RowValues::as_text), Some("item-03"));
    assert_eq!(row.get("price").and_then(RowValues::as_float), Some(4.5));

    assert!(
        db.select_one("SELECT id FROM item WHERE name = :name", &Params::named([("name", "nope")]))
            .is_none()
    );
    Ok(())
}

#[test]
fn named_parameters_bind_with_or_without_colon() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 4)?;

    let rows = db
        .try_select_all(
            "SELECT id FROM item WHERE id >= :low AND id <= :high ORDER BY id",
            &Params::named([(":low", 2), ("high", 3)]),
        )?;
    let ids: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.get("id").and_then(RowValues::as_int).copied())
        .collect();
    assert_eq!(ids, vec![2, 3]);
    Ok(())
}

#[test]
fn insert_with_return_id_gives_distinct_keys() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 0)?;

    let sql = "INSERT INTO item (name) VALUES (?1)";
    let first = db.insert(sql, &Params::positional(["a"]), true);
    let second = db.insert(sql, &Params::positional(["b"]), true);
    let (Some(a), Some(b)) = (first.id(), second.id()) else {
        return Err(format!("expected ids, got {first:?} / {second:?}").into());
    };
    assert_ne!(a, b);

    assert_eq!(
        db.insert(sql, &Params::positional(["c"]), false),
        InsertResult::Success(true)
    );
    // NOT NULL violation: no stale id comes back.
    assert_eq!(
        db.insert(sql, &Params::positional([RowValues::Null]), true),
        InsertResult::Success(false)
    );
    Ok(())
}

#[test]
fn ignored_insert_returns_no_key() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    db.try_raw_execute("CREATE TABLE tag (id INTEGER PRIMARY KEY, label TEXT UNIQUE NOT NULL);")?;

    let sql = "INSERT OR IGNORE INTO tag (label) VALUES (?1)";
    assert_eq!(db.insert(sql, &Params::positional(["a"]), true), InsertResult::Id(1));
    assert_eq!(
        db.insert(sql, &Params::positional(["a"]), true),
        InsertResult::Success(false)
    );
    assert!(db.try_insert_id(sql, &Params::positional(["a"])).is_err());

    let count = db
        .select_one("SELECT COUNT(*) AS n FROM tag", &Params::empty())
        .ok_or("count failed")?;
    assert_eq!(count.get("n"), Some(&RowValues::Int(1)));
    assert_eq!(db.insert(sql, &Params::positional(["b"]), true), InsertResult::Id(2));
    Ok(())
}

#[test]
fn pages_are_disjoint_and_cover_the_ordering() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 25)?;

    let query = "SELECT id FROM item ORDER BY id;";
    let ids = |set: ResultSet| -> Vec<i64> {
        set.iter()
            .filter_map(|r| r.get("id").and_then(RowValues::as_int).copied())
            .collect()
    };
    let first = ids(db.select_page(query, &Params::empty(), 0, 10).ok_or("page 1")?);
    let second = ids(db.select_page(query, &Params::empty(), 10, 10).ok_or("page 2")?);
    let top20 = ids(db.try_select_all("SELECT id FROM item ORDER BY id LIMIT 20", &Params::empty())?);

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    let a: HashSet<_> = first.iter().copied().collect();
    let b: HashSet<_> = second.iter().copied().collect();
    assert!(a.is_disjoint(&b));

    let mut union = first;
    union.extend(second);
    assert_eq!(union, top20);

    let tail = db.select_page(query, &Params::empty(), 20, 10).ok_or("page 3")?;
    assert_eq!(tail.len(), 5);
    Ok(())
}

#[test]
fn update_and_delete_succeed_even_when_nothing_matches() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    seeded(&db, 3)?;

    assert!(db.update("UPDATE item SET price = ?1 WHERE id = ?2", &Params::positional([
        RowValues::Float(9.0),
        RowValues::Int(1),
    ])));
    assert_eq!(
        db.try_update("UPDATE item SET price = 0 WHERE id = ?1", &Params::positional([99]))?,
        0
    );
    assert!(db.delete("DELETE FROM item WHERE id = ?1", &Params::positional([42])));
    assert_eq!(db.try_delete("DELETE FROM item WHERE id <= ?1", &Params::positional([2]))?, 2);

    let left = db.try_select_all("SELECT id FROM item", &Params::empty())?;
    assert_eq!(left.len(), 1);
    Ok(())
}

#[test]
fn failures_become_sentinels() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;

    assert!(db.select_all("SELECT * FROM missing", &Params::empty()).is_none());
    assert!(db.select_one("SELEC nonsense", &Params::empty()).is_none());
    assert!(db.select_page("SELECT * FROM missing", &Params::empty(), 0, 5).is_none());
    assert!(!db.update("UPDATE missing SET a = 1", &Params::empty()));
    assert!(!db.delete("DELETE FROM missing", &Params::empty()));
    assert!(!db.statement_no_params("DROP TABLE missing"));
    assert!(!db.raw_execute("CREATE TABLE"));
    assert!(db.prepare("SELECT * FROM missing").is_none());

    assert!(db.try_select_all("SELECT * FROM missing", &Params::empty()).is_err());
    Ok(())
}

#[test]
fn statement_no_params_and_raw_execute() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;

    assert!(db.statement_no_params("CREATE TABLE a (x INTEGER)"));
    assert!(db.raw_execute(
        "CREATE TABLE b (y INTEGER); INSERT INTO b VALUES (1); INSERT INTO b VALUES (2);"
    ));
    let count = db
        .select_one("SELECT count(*) AS n FROM b", &Params::empty())
        .ok_or("count")?;
    assert_eq!(count.get("n"), Some(&RowValues::Int(2)));
    Ok(())
}

#[test]
fn values_keep_their_native_types() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    db.try_raw_execute("CREATE TABLE v (i INTEGER, f REAL, t TEXT, b BLOB, n TEXT)")?;
    db.try_insert(
        "INSERT INTO v VALUES (?1, ?2, ?3, ?4, ?5)",
        &Params::positional([
            RowValues::Int(-5),
            RowValues::Float(0.5),
            RowValues::Text("héllo".into()),
            RowValues::Blob(vec![0, 1, 2]),
            RowValues::Null,
        ]),
    )?;
    let row = db.try_select_one("SELECT * FROM v", &Params::empty())?.ok_or("row")?;
    assert_eq!(row.get("i"), Some(&RowValues::Int(-5)));
    assert_eq!(row.get("f"), Some(&RowValues::Float(0.5)));
    assert_eq!(row.get("t"), Some(&RowValues::Text("héllo".into())));
    assert_eq!(row.get("b").and_then(RowValues::as_blob), Some(&[0u8, 1, 2][..]));
    assert!(row.get("n").is_some_and(RowValues::is_null));

    let json = serde_json::to_value(&row)?;
    assert_eq!(json["i"], -5);
    assert_eq!(json["t"], "héllo");
    assert!(json["n"].is_null());
    Ok(())
}

#[test]
fn file_database_persists_between_connections() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("app.db");
    let opts = DbOptions::sqlite(path.to_string_lossy());

    {
        let db = Db::connect(&opts)?;
        seeded(&db, 2)?;
    }
    let db = Db::connect(&opts)?;
    assert_eq!(db.database_type(), DatabaseType::Sqlite);
    let rows = db.try_select_all("SELECT * FROM item", &Params::empty())?;
    assert_eq!(rows.len(), 2);
    Ok(())
}

#[test]
fn wal_option_reaches_the_file_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let wal_path = dir.path().join("wal.db");
    let plain_path = dir.path().join("plain.db");
    let journal_mode = |opts: &DbOptions| -> Result<Option<String>, Box<dyn std::error::Error>> {
        let db = Db::connect(opts)?;
        let row = db.try_select_one("PRAGMA journal_mode", &Params::empty())?;
        Ok(row
            .and_then(|r| r.get_by_index(0).and_then(RowValues::as_text).map(str::to_ascii_lowercase)))
    };

    let wal = DbOptions::sqlite(wal_path.to_string_lossy()).with_wal(true);
    assert_eq!(journal_mode(&wal)?.as_deref(), Some("wal"));
    let plain = DbOptions::sqlite(plain_path.to_string_lossy());
    assert_eq!(journal_mode(&plain)?.as_deref(), Some("delete"));
    Ok(())
}

#[test]
fn raw_handle_is_reachable() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    let version = db.with_raw(|raw| match raw {
        AnyConnWrapper::Sqlite(conn) => conn
            .query_row("SELECT sqlite_version()", [], |r| r.get::<_, String>(0))
            .ok(),
        #[allow(unreachable_patterns)]
        _ => None,
    });
    assert!(version.is_some_and(|v| v.starts_with('3')));
    Ok(())
}

#[test]
fn bad_options_are_rejected() {
    assert!(matches!(
        Db::connect(&DbOptions::sqlite("  ")),
        Err(SqlWebError::ConfigError(_))
    ));
    assert!(matches!(
        Db::connect(&DbOptions::sqlite(":memory:").with_charset("latin1")),
        Err(SqlWebError::ConfigError(_))
    ));
}
