use chrono::{NaiveDate, Utc};
use masjidku::db::{self, models::CashEntry, models::Direction, CashFilter};
use tempfile::TempDir;
use uuid::Uuid;

fn test_pool() -> (db::DbPool, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let pool = db::init_pool_at(&dir.path().join("test.db")).expect("init pool");
    (pool, dir)
}

fn entry(date: &str, direction: Direction, amount: f64, category: &str) -> CashEntry {
    let now = Utc::now();
    CashEntry {
        id: Uuid::new_v4().to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
        direction,
        amount,
        category: category.to_string(),
        description: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn balance_is_inflow_minus_outflow() {
    let (pool, _dir) = test_pool();

    for e in [
        entry("2025-01-05", Direction::In, 750000.0, "Infaq Jumat"),
        entry("2025-01-12", Direction::In, 250000.0, "Kotak Amal"),
        entry("2025-01-15", Direction::Out, 400000.0, "Listrik"),
        entry("2025-01-20", Direction::Out, 100000.0, "Kebersihan"),
    ] {
        db::insert_cash_entry(&pool, &e).expect("insert");
    }

    let summary = db::cash_summary(&pool, &CashFilter::default()).expect("summary");
    assert_eq!(summary.total_in, 1000000.0);
    assert_eq!(summary.total_out, 500000.0);
    assert_eq!(summary.balance, summary.total_in - summary.total_out);
}

#[test]
fn empty_ledger_aggregates_to_zero() {
    let (pool, _dir) = test_pool();

    let entries = db::list_cash_entries(&pool, &CashFilter::default()).expect("list");
    assert!(entries.is_empty());

    let summary = db::cash_summary(&pool, &CashFilter::default()).expect("summary");
    assert_eq!(summary.total_in, 0.0);
    assert_eq!(summary.total_out, 0.0);
    assert_eq!(summary.balance, 0.0);
}

#[test]
fn direction_filter_with_inclusive_date_bounds() {
    let (pool, _dir) = test_pool();

    let before = entry("2024-12-31", Direction::In, 10000.0, "Infaq");
    let on_from = entry("2025-01-01", Direction::In, 20000.0, "Infaq");
    let inside_out = entry("2025-01-15", Direction::Out, 30000.0, "Listrik");
    let on_to = entry("2025-01-31", Direction::In, 40000.0, "Infaq");
    let after = entry("2025-02-01", Direction::In, 50000.0, "Infaq");
    for e in [&before, &on_from, &inside_out, &on_to, &after] {
        db::insert_cash_entry(&pool, e).expect("insert");
    }

    let filter = CashFilter {
        from: NaiveDate::from_ymd_opt(2025, 1, 1),
        to: NaiveDate::from_ymd_opt(2025, 1, 31),
        direction: Some(Direction::In),
    };
    let entries = db::list_cash_entries(&pool, &filter).expect("list");

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(entries.len(), 2);
    assert!(ids.contains(&on_from.id.as_str()));
    assert!(ids.contains(&on_to.id.as_str()));
    assert!(entries.iter().all(|e| e.direction == Direction::In));
}

#[test]
fn list_orders_newest_first() {
    let (pool, _dir) = test_pool();

    db::insert_cash_entry(&pool, &entry("2025-03-01", Direction::In, 1000.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-03-20", Direction::In, 2000.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-03-10", Direction::In, 3000.0, "Infaq")).expect("insert");

    let entries = db::list_cash_entries(&pool, &CashFilter::default()).expect("list");
    let dates: Vec<String> = entries.iter().map(|e| e.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-03-20", "2025-03-10", "2025-03-01"]);
}

#[test]
fn create_then_fetch_round_trips() {
    let (pool, _dir) = test_pool();

    let mut original = entry("2025-02-14", Direction::Out, 125000.5, "Perbaikan Sound");
    original.description = Some("Ganti kabel mic".to_string());
    db::insert_cash_entry(&pool, &original).expect("insert");

    let fetched = db::get_cash_entry(&pool, &original.id)
        .expect("get")
        .expect("entry exists");
    assert_eq!(fetched, original);
}

#[test]
fn delete_is_idempotent_in_effect() {
    let (pool, _dir) = test_pool();

    let e = entry("2025-02-01", Direction::In, 5000.0, "Infaq");
    db::insert_cash_entry(&pool, &e).expect("insert");

    assert!(db::delete_cash_entry(&pool, &e.id).expect("first delete"));
    assert!(db::get_cash_entry(&pool, &e.id).expect("get").is_none());
    assert!(!db::delete_cash_entry(&pool, &e.id).expect("second delete"));
    assert!(db::get_cash_entry(&pool, &e.id).expect("get").is_none());
}

#[test]
fn update_overwrites_unconditionally() {
    let (pool, _dir) = test_pool();

    let mut e = entry("2025-04-01", Direction::In, 10000.0, "Infaq");
    db::insert_cash_entry(&pool, &e).expect("insert");

    e.amount = 20000.0;
    e.category = "Zakat".to_string();
    assert!(db::update_cash_entry(&pool, &e).expect("update"));

    // Same payload again: idempotent.
    assert!(db::update_cash_entry(&pool, &e).expect("repeat update"));

    let fetched = db::get_cash_entry(&pool, &e.id).expect("get").expect("exists");
    assert_eq!(fetched.amount, 20000.0);
    assert_eq!(fetched.category, "Zakat");

    let missing = entry("2025-04-01", Direction::In, 1.0, "Infaq");
    assert!(!db::update_cash_entry(&pool, &missing).expect("update missing"));
}

#[test]
fn month_to_date_covers_current_month_only() {
    let (pool, _dir) = test_pool();

    let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    db::insert_cash_entry(&pool, &entry("2025-05-31", Direction::In, 99999.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-06-01", Direction::In, 100000.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-06-10", Direction::Out, 25000.0, "Listrik")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-06-20", Direction::In, 77777.0, "Infaq")).expect("insert");

    let summary = db::month_to_date_summary(&pool, today).expect("summary");
    assert_eq!(summary.total_in, 100000.0);
    assert_eq!(summary.total_out, 25000.0);
    assert_eq!(summary.balance, 75000.0);
}

#[test]
fn monthly_totals_bucket_by_month() {
    let (pool, _dir) = test_pool();

    db::insert_cash_entry(&pool, &entry("2025-01-10", Direction::In, 100.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-01-20", Direction::Out, 40.0, "Listrik")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-03-05", Direction::In, 200.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2024-12-31", Direction::In, 999.0, "Infaq")).expect("insert");

    let buckets = db::monthly_totals(&pool, 2025).expect("buckets");
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].month, 1);
    assert_eq!(buckets[0].total_in, 100.0);
    assert_eq!(buckets[0].total_out, 40.0);
    assert_eq!(buckets[1].month, 3);
    assert_eq!(buckets[1].total_in, 200.0);
}

#[test]
fn report_years_are_distinct_and_newest_first() {
    let (pool, _dir) = test_pool();

    db::insert_cash_entry(&pool, &entry("2024-06-01", Direction::In, 1.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2024-07-01", Direction::In, 1.0, "Infaq")).expect("insert");
    db::insert_cash_entry(&pool, &entry("2025-01-01", Direction::In, 1.0, "Infaq")).expect("insert");

    let years = db::ledger_years(&pool).expect("years");
    assert_eq!(years, vec![2025, 2024]);
}
