//! Data models for MedX.
//!
//! Every entity that moves through a workflow carries a status enum implementing
//! [`Lifecycle`], which is the single source of truth for which transitions exist.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};

/// The portals a signed-in identity can enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Hospital,
    Driver,
    Pharmacy,
}

impl Role {
    /// Every role, in the order the role-selection screen shows them.
    pub const ALL: [Role; 4] = [Role::Patient, Role::Hospital, Role::Driver, Role::Pharmacy];

    /// The identifier stored in access-code records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Hospital => "hospital",
            Role::Driver => "driver",
            Role::Pharmacy => "pharmacy",
        }
    }

    /// Parses a stored role identifier.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "patient" => Some(Role::Patient),
            "hospital" => Some(Role::Hospital),
            "driver" => Some(Role::Driver),
            "pharmacy" => Some(Role::Pharmacy),
            _ => None,
        }
    }

    /// Title shown on the portal card.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Hospital => "Hospital",
            Role::Driver => "Emergency Driver",
            Role::Pharmacy => "Pharmacy",
        }
    }

    /// One-line summary shown under the portal title.
    pub fn description(&self) -> &'static str {
        match self {
            Role::Patient => "AI Diagnosis, Bookings & Emergency",
            Role::Hospital => "OPD Management & Triage",
            Role::Driver => "Dispatch & Navigation",
            Role::Pharmacy => "Inventory & Orders",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity a dashboard runs as. Fixed for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

/// A status enum with a fixed successor set.
pub trait Lifecycle: Copy + PartialEq + fmt::Display + 'static {
    /// The statuses this one may move to.
    fn successors(self) -> &'static [Self];

    fn can_advance_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

/// How a consultation takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationType {
    Audio,
    Video,
    InPerson,
}

impl ConsultationType {
    pub const ALL: [ConsultationType; 3] = [
        ConsultationType::Audio,
        ConsultationType::Video,
        ConsultationType::InPerson,
    ];

    /// Consultation fee in rupees.
    pub fn fee(&self) -> u32 {
        match self {
            ConsultationType::Audio => 299,
            ConsultationType::Video => 499,
            ConsultationType::InPerson => 899,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsultationType::Audio => "Audio",
            ConsultationType::Video => "Video",
            ConsultationType::InPerson => "In-Person",
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl Lifecycle for ConsultationStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            ConsultationStatus::Pending => {
                &[ConsultationStatus::Confirmed, ConsultationStatus::Cancelled]
            }
            ConsultationStatus::Confirmed
            | ConsultationStatus::Completed
            | ConsultationStatus::Cancelled => &[],
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsultationStatus::Pending => "Pending",
            ConsultationStatus::Confirmed => "Confirmed",
            ConsultationStatus::Completed => "Completed",
            ConsultationStatus::Cancelled => "Cancelled",
        })
    }
}

/// A booked doctor consultation.
#[derive(Debug, Clone, PartialEq)]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub hospital_id: String,
    pub hospital_name: String,
    pub date: Date,
    pub symptoms: String,
    pub kind: ConsultationType,
    pub status: ConsultationStatus,
    /// Fee in rupees.
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Bike,
    Car,
    Ambulance,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Bike, VehicleType::Car, VehicleType::Ambulance];

    /// Quoted arrival time for a fresh request.
    pub fn eta_minutes(&self) -> u32 {
        match self {
            VehicleType::Bike => 3,
            VehicleType::Car => 8,
            VehicleType::Ambulance => 12,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleType::Bike => "Bike",
            VehicleType::Car => "Car",
            VehicleType::Ambulance => "Ambulance",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideStatus {
    Requested,
    EnRoute,
    PickedUp,
    Completed,
}

impl RideStatus {
    /// The single status a ride moves to next, if any.
    pub fn next(self) -> Option<RideStatus> {
        self.successors().first().copied()
    }
}

impl Lifecycle for RideStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            RideStatus::Requested => &[RideStatus::EnRoute],
            RideStatus::EnRoute => &[RideStatus::PickedUp],
            RideStatus::PickedUp => &[RideStatus::Completed],
            RideStatus::Completed => &[],
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RideStatus::Requested => "Requested",
            RideStatus::EnRoute => "En Route",
            RideStatus::PickedUp => "Picked Up",
            RideStatus::Completed => "Completed",
        })
    }
}

/// An emergency transport request.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    /// Bound when a driver accepts the ride.
    pub driver_name: Option<String>,
    pub vehicle: VehicleType,
    pub pickup_location: String,
    pub drop_location: String,
    pub status: RideStatus,
    pub request_time: OffsetDateTime,
    pub eta_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Placed,
    Preparing,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub fn next(self) -> Option<OrderStatus> {
        self.successors().first().copied()
    }

    /// Label of the pharmacy action that moves an order out of this status.
    pub fn action_label(self) -> Option<&'static str> {
        match self {
            OrderStatus::Placed => Some("Accept & Prepare"),
            OrderStatus::Preparing => Some("Mark Ready"),
            OrderStatus::Ready => Some("Complete Order"),
            OrderStatus::Delivered => None,
        }
    }

    /// Fulfilment progress shown on the pharmacy progress bar.
    pub fn progress_percent(self) -> u16 {
        match self {
            OrderStatus::Placed => 10,
            OrderStatus::Preparing => 50,
            OrderStatus::Ready => 80,
            OrderStatus::Delivered => 100,
        }
    }
}

impl Lifecycle for OrderStatus {
    fn successors(self) -> &'static [Self] {
        match self {
            OrderStatus::Placed => &[OrderStatus::Preparing],
            OrderStatus::Preparing => &[OrderStatus::Ready],
            OrderStatus::Ready => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Delivered => "Delivered",
        })
    }
}

/// A pharmacy order placed by a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineOrder {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub items: Vec<String>,
    /// Bill total in rupees.
    pub total_amount: u32,
    pub status: OrderStatus,
    pub date: OffsetDateTime,
}

/// A hospital a consultation can be booked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hospital {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
}

pub const HOSPITALS: [Hospital; 3] = [
    Hospital {
        id: "h1",
        name: "Apollo Hospitals",
        location: "Jubilee Hills",
    },
    Hospital {
        id: "h2",
        name: "Yashoda Hospitals",
        location: "Secunderabad",
    },
    Hospital {
        id: "h3",
        name: "KIMS",
        location: "Begumpet",
    },
];

/// Looks a hospital up in the catalogue.
pub fn find_hospital(id: &str) -> Option<&'static Hospital> {
    HOSPITALS.iter().find(|h| h.id == id)
}

/// Severity levels the triage model classifies symptoms into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Moderate,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Normal => "normal",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        })
    }
}

/// Structured result of a symptom analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageReport {
    pub severity: Severity,
    pub advice: String,
    #[serde(rename = "suggestedAction")]
    pub suggested_action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Patient,
    Assistant,
}

/// One line of the patient's assistant transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: OffsetDateTime,
    pub severity: Option<Severity>,
}

impl ChatMessage {
    pub fn from_patient(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Patient,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
            severity: None,
        }
    }

    /// Formats a triage report the way the assistant replies.
    pub fn from_report(report: &TriageReport) -> Self {
        Self {
            sender: Sender::Assistant,
            text: format!(
                "{}\n\nSuggested Action: {}",
                report.advice, report.suggested_action
            ),
            timestamp: OffsetDateTime::now_utc(),
            severity: Some(report.severity),
        }
    }

    pub fn greeting(name: &str) -> Self {
        Self {
            sender: Sender::Assistant,
            text: format!("Hello {name}, I'm your MedX Health Assistant.\nHow are you feeling today?"),
            timestamp: OffsetDateTime::now_utc(),
            severity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_identifiers_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("user"), None);
    }

    #[test]
    fn consultation_only_leaves_pending() {
        use ConsultationStatus::*;
        assert!(Pending.can_advance_to(Confirmed));
        assert!(Pending.can_advance_to(Cancelled));
        assert!(!Pending.can_advance_to(Completed));
        assert!(Confirmed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Cancelled.can_advance_to(Pending));
    }

    #[test]
    fn ride_status_is_a_straight_line() {
        let mut status = RideStatus::Requested;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = next;
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                RideStatus::Requested,
                RideStatus::EnRoute,
                RideStatus::PickedUp,
                RideStatus::Completed
            ]
        );
        assert!(!RideStatus::Completed.can_advance_to(RideStatus::Requested));
        assert!(!RideStatus::Requested.can_advance_to(RideStatus::PickedUp));
    }

    #[test]
    fn order_cannot_skip_steps() {
        assert!(!OrderStatus::Placed.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Ready.can_advance_to(OrderStatus::Placed));
        assert_eq!(OrderStatus::Placed.action_label(), Some("Accept & Prepare"));
        assert_eq!(OrderStatus::Delivered.action_label(), None);
    }

    #[test]
    fn fees_and_etas_match_the_price_list() {
        assert_eq!(ConsultationType::Audio.fee(), 299);
        assert_eq!(ConsultationType::Video.fee(), 499);
        assert_eq!(ConsultationType::InPerson.fee(), 899);
        assert_eq!(VehicleType::Bike.eta_minutes(), 3);
        assert_eq!(VehicleType::Car.eta_minutes(), 8);
        assert_eq!(VehicleType::Ambulance.eta_minutes(), 12);
    }

    #[test]
    fn status_labels_use_display_spelling() {
        assert_eq!(RideStatus::EnRoute.to_string(), "En Route");
        assert_eq!(RideStatus::PickedUp.to_string(), "Picked Up");
        assert_eq!(ConsultationType::InPerson.to_string(), "In-Person");
    }

    #[test]
    fn triage_report_uses_camel_case_on_the_wire() {
        let report: TriageReport = serde_json::from_str(
            r#"{"severity":"severe","advice":"Call now","suggestedAction":"Dispatch"}"#,
        )
        .unwrap();
        assert_eq!(report.severity, Severity::Severe);
        assert_eq!(report.suggested_action, "Dispatch");
    }

    #[test]
    fn assistant_reply_carries_the_suggested_action() {
        let report = TriageReport {
            severity: Severity::Moderate,
            advice: "See a doctor.".into(),
            suggested_action: "Book consultation".into(),
        };
        let message = ChatMessage::from_report(&report);
        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.text, "See a doctor.\n\nSuggested Action: Book consultation");
        assert_eq!(message.severity, Some(Severity::Moderate));
    }

    #[test]
    fn hospital_lookup() {
        assert_eq!(find_hospital("h2").map(|h| h.name), Some("Yashoda Hospitals"));
        assert!(find_hospital("h9").is_none());
    }
}
