use chrono::{NaiveDate, Utc};
use masjidku::db::{
    self,
    models::{
        Appointment, AppointmentStatus, Donation, DonationCategory, DonationStatus, PaymentMethod,
        ANONYMOUS_DONOR,
    },
    DonationFilter,
};
use tempfile::TempDir;
use uuid::Uuid;

fn test_pool() -> (db::DbPool, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let pool = db::init_pool_at(&dir.path().join("test.db")).expect("init pool");
    (pool, dir)
}

fn donation(donor: &str, date: &str, amount: f64, status: DonationStatus) -> Donation {
    let now = Utc::now();
    Donation {
        id: Uuid::new_v4().to_string(),
        donor_name: donor.to_string(),
        email: None,
        phone: None,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
        category: DonationCategory::Infaq,
        program: None,
        amount,
        payment_method: PaymentMethod::Cash,
        status,
        anonymous: donor == ANONYMOUS_DONOR,
        description: None,
        created_at: now,
        updated_at: now,
    }
}

fn january_2025_confirmed() -> DonationFilter {
    DonationFilter {
        from: NaiveDate::from_ymd_opt(2025, 1, 1),
        to: NaiveDate::from_ymd_opt(2025, 1, 31),
        category: None,
        status: Some(DonationStatus::Confirmed),
    }
}

#[test]
fn stats_report_zero_average_for_empty_set() {
    let (pool, _dir) = test_pool();

    let stats = db::donation_stats(&pool, &DonationFilter::default()).expect("stats");
    assert_eq!(stats.total, 0.0);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.donor_count, 0);
    assert_eq!(stats.average, 0.0);
}

#[test]
fn average_is_total_over_count() {
    let (pool, _dir) = test_pool();

    db::insert_donation(&pool, &donation("Pak Budi", "2025-01-05", 100000.0, DonationStatus::Confirmed))
        .expect("insert");
    db::insert_donation(&pool, &donation("Ibu Siti", "2025-01-06", 50000.0, DonationStatus::Confirmed))
        .expect("insert");

    let stats = db::donation_stats(&pool, &DonationFilter::default()).expect("stats");
    assert_eq!(stats.total, 150000.0);
    assert_eq!(stats.count, 2);
    assert_eq!(stats.average, 75000.0);
}

#[test]
fn donors_sharing_a_name_collapse_to_one() {
    let (pool, _dir) = test_pool();

    db::insert_donation(&pool, &donation(ANONYMOUS_DONOR, "2025-01-05", 10000.0, DonationStatus::Confirmed))
        .expect("insert");
    db::insert_donation(&pool, &donation(ANONYMOUS_DONOR, "2025-01-08", 20000.0, DonationStatus::Confirmed))
        .expect("insert");
    db::insert_donation(&pool, &donation("Pak Budi", "2025-01-09", 30000.0, DonationStatus::Confirmed))
        .expect("insert");

    let stats = db::donation_stats(&pool, &DonationFilter::default()).expect("stats");
    assert_eq!(stats.count, 3);
    assert_eq!(stats.donor_count, 2);
}

#[test]
fn donation_round_trips_field_for_field() {
    let (pool, _dir) = test_pool();

    let mut original = donation("Pak Budi", "2025-02-10", 250000.0, DonationStatus::Pending);
    original.email = Some("budi@example.com".to_string());
    original.program = Some("Renovasi Tempat Wudhu".to_string());
    original.payment_method = PaymentMethod::Transfer;
    db::insert_donation(&pool, &original).expect("insert");

    let fetched = db::get_donation(&pool, &original.id)
        .expect("get")
        .expect("donation exists");
    assert_eq!(fetched, original);
}

#[test]
fn delete_reports_not_found_twice() {
    let (pool, _dir) = test_pool();

    let d = donation("Pak Budi", "2025-02-10", 1000.0, DonationStatus::Pending);
    db::insert_donation(&pool, &d).expect("insert");

    assert!(db::delete_donation(&pool, &d.id).expect("first delete"));
    assert!(db::get_donation(&pool, &d.id).expect("get").is_none());
    assert!(!db::delete_donation(&pool, &d.id).expect("second delete"));
}

#[test]
fn category_and_status_filters_narrow_the_listing() {
    let (pool, _dir) = test_pool();

    let mut zakat = donation("Pak Budi", "2025-01-05", 100000.0, DonationStatus::Confirmed);
    zakat.category = DonationCategory::Zakat;
    db::insert_donation(&pool, &zakat).expect("insert");
    db::insert_donation(&pool, &donation("Ibu Siti", "2025-01-06", 50000.0, DonationStatus::Pending))
        .expect("insert");

    let filter = DonationFilter {
        category: Some(DonationCategory::Zakat),
        ..Default::default()
    };
    let listed = db::list_donations(&pool, &filter).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, zakat.id);

    let confirmed_only = DonationFilter {
        status: Some(DonationStatus::Confirmed),
        ..Default::default()
    };
    let listed = db::list_donations(&pool, &confirmed_only).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, DonationStatus::Confirmed);
}

// Spec scenario: an anonymous submission lands as pending, and the January
// confirmed total rises by the donated amount once an admin confirms it.
#[test]
fn anonymous_submission_counts_after_confirmation() {
    let (pool, _dir) = test_pool();

    let before = db::donation_stats(&pool, &january_2025_confirmed()).expect("stats");

    let mut submitted = donation(ANONYMOUS_DONOR, "2025-01-01", 50000.0, DonationStatus::Pending);
    submitted.category = DonationCategory::Sedekah;
    db::insert_donation(&pool, &submitted).expect("insert");

    // Pending submissions stay out of the confirmed totals.
    let pending_stats = db::donation_stats(&pool, &january_2025_confirmed()).expect("stats");
    assert_eq!(pending_stats.total, before.total);

    submitted.status = DonationStatus::Confirmed;
    submitted.updated_at = Utc::now();
    assert!(db::update_donation(&pool, &submitted).expect("confirm"));

    let after = db::donation_stats(&pool, &january_2025_confirmed()).expect("stats");
    assert_eq!(after.total, before.total + 50000.0);
    assert_eq!(after.donor_count, 1);

    let stored = db::get_donation(&pool, &submitted.id).expect("get").expect("exists");
    assert_eq!(stored.donor_name, ANONYMOUS_DONOR);
}

#[test]
fn appointment_lifecycle() {
    let (pool, _dir) = test_pool();

    let now = Utc::now();
    let mut appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        requester_name: "Ibu Siti".to_string(),
        email: None,
        phone: Some("0812000111".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        time: "09:30".to_string(),
        ustadz_id: None,
        topic: "Konsultasi zakat penghasilan".to_string(),
        description: None,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    db::insert_appointment(&pool, &appointment).expect("insert");

    let pending = db::list_appointments(&pool, Some(AppointmentStatus::Pending)).expect("list");
    assert_eq!(pending.len(), 1);

    appointment.status = AppointmentStatus::Completed;
    appointment.updated_at = Utc::now();
    assert!(db::update_appointment(&pool, &appointment).expect("update"));

    assert!(db::list_appointments(&pool, Some(AppointmentStatus::Pending))
        .expect("list")
        .is_empty());
    let completed = db::list_appointments(&pool, Some(AppointmentStatus::Completed)).expect("list");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0], appointment);

    assert!(db::delete_appointment(&pool, &appointment.id).expect("delete"));
    assert!(db::get_appointment(&pool, &appointment.id).expect("get").is_none());
}
