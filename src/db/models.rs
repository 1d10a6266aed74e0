use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Donor label used when a donation is submitted anonymously or without a name.
pub const ANONYMOUS_DONOR: &str = "Hamba Allah";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DonationCategory {
    Infaq,
    Sedekah,
    Zakat,
}

impl DonationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationCategory::Infaq => "infaq",
            DonationCategory::Sedekah => "sedekah",
            DonationCategory::Zakat => "zakat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "infaq" => Some(DonationCategory::Infaq),
            "sedekah" => Some(DonationCategory::Sedekah),
            "zakat" => Some(DonationCategory::Zakat),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Qris,
    Ewallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Qris => "qris",
            PaymentMethod::Ewallet => "ewallet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "transfer" => Some(PaymentMethod::Transfer),
            "qris" => Some(PaymentMethod::Qris),
            "ewallet" => Some(PaymentMethod::Ewallet),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Confirmed => "confirmed",
            DonationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DonationStatus::Pending),
            "confirmed" => Some(DonationStatus::Confirmed),
            "cancelled" => Some(DonationStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "completed" => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CashEntry {
    pub id: String,
    pub date: NaiveDate,
    pub direction: Direction,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: String,
    pub donor_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub category: DonationCategory,
    pub program: Option<String>,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: DonationStatus,
    pub anonymous: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub requester_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: NaiveDate,
    /// "HH:MM", validated at the route boundary.
    pub time: String,
    pub ustadz_id: Option<String>,
    pub topic: String,
    pub description: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub position: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewsPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub published_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
