//! In-memory entity store for MedX.
//!
//! Holds the consultations, rides and medicine orders every dashboard reads from.
//! Records are appended and then only ever have their status moved forward; the
//! [`Command`] enum is the write path the application coordinator uses.

use crate::models::{
    find_hospital, Consultation, ConsultationStatus, ConsultationType, Identity, Lifecycle,
    MedicineOrder, OrderStatus, Ride, RideStatus, Role, VehicleType,
};
use thiserror::Error;
use time::{macros::date, Date, OffsetDateTime};
use tracing::{debug, info, warn};

const DEFAULT_DOCTOR: &str = "Assigned Specialist";
const DEFAULT_SYMPTOMS: &str = "General Checkup";
const FALLBACK_HOSPITAL: &str = "Hospital";
const DEFAULT_PICKUP: &str = "Current Location";
const DEFAULT_DROP: &str = "Nearest Hospital (Apollo)";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{id} cannot move from {from} to {to}")]
    IllegalTransition { id: String, from: String, to: String },

    #[error("{role} accounts cannot {action}")]
    Forbidden { role: Role, action: &'static str },

    #[error("ride {id} is assigned to another driver")]
    NotAssignedDriver { id: String },
}

/// A stored entity with a lifecycle status.
pub trait Record {
    type Status: Lifecycle;

    fn id(&self) -> &str;
    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}

impl Record for Consultation {
    type Status = ConsultationStatus;

    fn id(&self) -> &str {
        &self.id
    }
    fn status(&self) -> ConsultationStatus {
        self.status
    }
    fn set_status(&mut self, status: ConsultationStatus) {
        self.status = status;
    }
}

impl Record for Ride {
    type Status = RideStatus;

    fn id(&self) -> &str {
        &self.id
    }
    fn status(&self) -> RideStatus {
        self.status
    }
    fn set_status(&mut self, status: RideStatus) {
        self.status = status;
    }
}

impl Record for MedicineOrder {
    type Status = OrderStatus;

    fn id(&self) -> &str {
        &self.id
    }
    fn status(&self) -> OrderStatus {
        self.status
    }
    fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

/// Append-only list of records, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    fn append(&mut self, item: T) -> &T {
        let index = self.items.len();
        self.items.push(item);
        &self.items[index]
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Records matching `predicate`, in insertion order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(item)).collect()
    }

    /// Moves the record `id` to `next`.
    ///
    /// Returns `Ok(false)` when no record has that id. `bind` runs after the
    /// transition is known to be legal and before the status changes; it must not
    /// mutate the record before it decides to return an error.
    fn update_status<F>(&mut self, id: &str, next: T::Status, bind: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut T) -> Result<(), StoreError>,
    {
        let Some(record) = self.items.iter_mut().find(|item| item.id() == id) else {
            debug!(id, "status update for unknown id ignored");
            return Ok(false);
        };

        let current = record.status();
        if !current.can_advance_to(next) {
            return Err(StoreError::IllegalTransition {
                id: id.to_string(),
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        bind(record)?;
        record.set_status(next);
        Ok(true)
    }
}

/// Details a patient supplies when booking a consultation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConsultation {
    pub hospital_id: String,
    pub date: Date,
    pub symptoms: String,
    pub kind: ConsultationType,
}

/// Details a patient supplies when requesting emergency transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRide {
    pub vehicle: VehicleType,
}

/// Details a patient supplies when ordering medicine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<String>,
    pub total_amount: u32,
}

/// A mutation requested by a dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BookConsultation(NewConsultation),
    ReviewConsultation { id: String, status: ConsultationStatus },
    RequestRide(NewRide),
    /// Advance a ride; the acting driver's name is bound on acceptance.
    AdvanceRide { id: String, status: RideStatus },
    PlaceOrder(NewOrder),
    AdvanceOrder { id: String, status: OrderStatus },
}

impl Command {
    /// The only role allowed to issue this command.
    pub fn required_role(&self) -> Role {
        match self {
            Command::BookConsultation(_) | Command::RequestRide(_) | Command::PlaceOrder(_) => {
                Role::Patient
            }
            Command::ReviewConsultation { .. } => Role::Hospital,
            Command::AdvanceRide { .. } => Role::Driver,
            Command::AdvanceOrder { .. } => Role::Pharmacy,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Command::BookConsultation(_) => "book consultations",
            Command::ReviewConsultation { .. } => "review consultations",
            Command::RequestRide(_) => "request rides",
            Command::AdvanceRide { .. } => "update rides",
            Command::PlaceOrder(_) => "place orders",
            Command::AdvanceOrder { .. } => "update orders",
        }
    }
}

/// What applying a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(String),
    Updated(String),
    /// The id did not match any record.
    Ignored(String),
}

/// Hands out unique, increasing, time-based ids.
#[derive(Debug, Default)]
struct IdGenerator {
    last: i128,
}

impl IdGenerator {
    fn next(&mut self) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let id = now.max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// The shared application state every dashboard renders from.
#[derive(Debug, Default)]
pub struct EntityStore {
    consultations: Collection<Consultation>,
    rides: Collection<Ride>,
    orders: Collection<MedicineOrder>,
    ids: IdGenerator,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the sample history the demo starts with.
    pub fn with_demo_data() -> Self {
        let mut store = Self::new();
        store.consultations.append(Consultation {
            id: "c1".to_string(),
            patient_id: "123".to_string(),
            patient_name: "John Doe".to_string(),
            doctor_name: "Dr. Sarah Smith".to_string(),
            hospital_id: "h1".to_string(),
            hospital_name: "Apollo Hospitals".to_string(),
            date: date!(2023 - 10 - 12),
            symptoms: "Mild fever and cough".to_string(),
            kind: ConsultationType::Video,
            status: ConsultationStatus::Completed,
            amount: ConsultationType::Video.fee(),
        });
        store
    }

    pub fn consultations(&self) -> &Collection<Consultation> {
        &self.consultations
    }

    pub fn rides(&self) -> &Collection<Ride> {
        &self.rides
    }

    pub fn orders(&self) -> &Collection<MedicineOrder> {
        &self.orders
    }

    /// Applies a dashboard command on behalf of `actor`.
    pub fn apply(&mut self, actor: &Identity, command: Command) -> Result<Outcome, StoreError> {
        if actor.role != command.required_role() {
            warn!(role = %actor.role, action = command.action(), "command rejected for role");
            return Err(StoreError::Forbidden {
                role: actor.role,
                action: command.action(),
            });
        }

        match command {
            Command::BookConsultation(details) => {
                let id = self.add_consultation(actor, details)?.id.clone();
                Ok(Outcome::Created(id))
            }
            Command::ReviewConsultation { id, status } => {
                let updated = self.update_consultation_status(&id, status)?;
                Ok(Self::outcome(id, updated))
            }
            Command::RequestRide(details) => {
                let id = self.add_ride(actor, details).id.clone();
                Ok(Outcome::Created(id))
            }
            Command::AdvanceRide { id, status } => {
                let updated = self.update_ride_status(&id, status, &actor.display_name)?;
                Ok(Self::outcome(id, updated))
            }
            Command::PlaceOrder(details) => {
                let id = self.add_order(actor, details)?.id.clone();
                Ok(Outcome::Created(id))
            }
            Command::AdvanceOrder { id, status } => {
                let updated = self.update_order_status(&id, status)?;
                Ok(Self::outcome(id, updated))
            }
        }
    }

    fn outcome(id: String, updated: bool) -> Outcome {
        if updated {
            Outcome::Updated(id)
        } else {
            Outcome::Ignored(id)
        }
    }

    pub fn add_consultation(
        &mut self,
        patient: &Identity,
        details: NewConsultation,
    ) -> Result<&Consultation, StoreError> {
        if details.hospital_id.trim().is_empty() {
            return Err(StoreError::MissingField {
                field: "hospital",
            });
        }

        let hospital_name = find_hospital(&details.hospital_id)
            .map(|h| h.name)
            .unwrap_or(FALLBACK_HOSPITAL)
            .to_string();
        let symptoms = if details.symptoms.trim().is_empty() {
            DEFAULT_SYMPTOMS.to_string()
        } else {
            details.symptoms.trim().to_string()
        };

        let consultation = Consultation {
            id: self.ids.next(),
            patient_id: patient.id.clone(),
            patient_name: patient.display_name.clone(),
            doctor_name: DEFAULT_DOCTOR.to_string(),
            hospital_id: details.hospital_id,
            hospital_name,
            date: details.date,
            symptoms,
            kind: details.kind,
            status: ConsultationStatus::Pending,
            amount: details.kind.fee(),
        };
        info!(id = %consultation.id, hospital = %consultation.hospital_id, kind = %consultation.kind, "consultation booked");
        Ok(self.consultations.append(consultation))
    }

    pub fn update_consultation_status(
        &mut self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<bool, StoreError> {
        let updated = self.consultations.update_status(id, status, |_| Ok(()))?;
        if updated {
            info!(id, %status, "consultation updated");
        }
        Ok(updated)
    }

    pub fn add_ride(&mut self, patient: &Identity, details: NewRide) -> &Ride {
        let ride = Ride {
            id: self.ids.next(),
            patient_id: patient.id.clone(),
            patient_name: patient.display_name.clone(),
            driver_name: None,
            vehicle: details.vehicle,
            pickup_location: DEFAULT_PICKUP.to_string(),
            drop_location: DEFAULT_DROP.to_string(),
            status: RideStatus::Requested,
            request_time: OffsetDateTime::now_utc(),
            eta_minutes: details.vehicle.eta_minutes(),
        };
        info!(id = %ride.id, vehicle = %ride.vehicle, "ride requested");
        self.rides.append(ride)
    }

    /// Moves a ride forward on behalf of `driver_name`.
    ///
    /// Any driver may accept a requested ride, which binds them to it; later
    /// steps are reserved for the bound driver.
    pub fn update_ride_status(
        &mut self,
        id: &str,
        status: RideStatus,
        driver_name: &str,
    ) -> Result<bool, StoreError> {
        let updated = self.rides.update_status(id, status, |ride| {
            if ride.status == RideStatus::Requested {
                ride.driver_name = Some(driver_name.to_string());
                Ok(())
            } else if ride.driver_name.as_deref() == Some(driver_name) {
                Ok(())
            } else {
                Err(StoreError::NotAssignedDriver { id: ride.id.clone() })
            }
        })?;
        if updated {
            info!(id, %status, driver = driver_name, "ride updated");
        }
        Ok(updated)
    }

    pub fn add_order(
        &mut self,
        patient: &Identity,
        details: NewOrder,
    ) -> Result<&MedicineOrder, StoreError> {
        if details.items.is_empty() {
            return Err(StoreError::MissingField { field: "items" });
        }

        let order = MedicineOrder {
            id: self.ids.next(),
            patient_id: patient.id.clone(),
            patient_name: patient.display_name.clone(),
            items: details.items,
            total_amount: details.total_amount,
            status: OrderStatus::Placed,
            date: OffsetDateTime::now_utc(),
        };
        info!(id = %order.id, items = order.items.len(), "order placed");
        Ok(self.orders.append(order))
    }

    pub fn update_order_status(&mut self, id: &str, status: OrderStatus) -> Result<bool, StoreError> {
        let updated = self.orders.update_status(id, status, |_| Ok(()))?;
        if updated {
            info!(id, %status, "order updated");
        }
        Ok(updated)
    }

    /// Consultations waiting for a hospital decision.
    pub fn pending_consultations(&self) -> Vec<&Consultation> {
        self.consultations
            .filter(|c| c.status == ConsultationStatus::Pending)
    }

    pub fn consultations_for(&self, patient_id: &str) -> Vec<&Consultation> {
        self.consultations.filter(|c| c.patient_id == patient_id)
    }

    /// Rides the hospital still has to expect.
    pub fn active_emergencies(&self) -> Vec<&Ride> {
        self.rides.filter(|r| !r.status.is_terminal())
    }

    /// Rides no driver has accepted yet.
    pub fn open_rides(&self) -> Vec<&Ride> {
        self.rides.filter(|r| r.status == RideStatus::Requested)
    }

    /// The unfinished ride bound to `driver_name`, if any.
    pub fn active_ride_for(&self, driver_name: &str) -> Option<&Ride> {
        self.rides.all().iter().find(|r| {
            r.driver_name.as_deref() == Some(driver_name) && !r.status.is_terminal()
        })
    }

    pub fn rides_for(&self, patient_id: &str) -> Vec<&Ride> {
        self.rides.filter(|r| r.patient_id == patient_id)
    }

    /// Orders the pharmacy has not delivered yet.
    pub fn active_orders(&self) -> Vec<&MedicineOrder> {
        self.orders.filter(|o| !o.status.is_terminal())
    }

    pub fn orders_for(&self, patient_id: &str) -> Vec<&MedicineOrder> {
        self.orders.filter(|o| o.patient_id == patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, name: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: name.to_string(),
            email: format!("{id}@medx.test"),
            role,
        }
    }

    fn patient() -> Identity {
        identity("p1", "Asha", Role::Patient)
    }

    fn booking() -> NewConsultation {
        NewConsultation {
            hospital_id: "h1".to_string(),
            date: date!(2024 - 01 - 01),
            symptoms: "fever".to_string(),
            kind: ConsultationType::Video,
        }
    }

    fn prescription() -> NewOrder {
        NewOrder {
            items: vec![
                "Paracetamol 500mg".to_string(),
                "Cough Syrup".to_string(),
                "Vitamin C".to_string(),
            ],
            total_amount: 1250,
        }
    }

    #[test]
    fn booking_is_pending_and_reaches_hospital_queue() {
        let mut store = EntityStore::with_demo_data();
        let hospital = identity("h-staff", "Front Desk", Role::Hospital);

        let outcome = store
            .apply(&patient(), Command::BookConsultation(booking()))
            .unwrap();
        let id = match outcome {
            Outcome::Created(id) => id,
            other => panic!("expected a created record, got {other:?}"),
        };

        let created = store.consultations().get(&id).unwrap();
        assert_eq!(created.status, ConsultationStatus::Pending);
        assert_eq!(created.kind, ConsultationType::Video);
        assert_eq!(created.amount, 499);
        assert_eq!(created.hospital_name, "Apollo Hospitals");
        assert_eq!(created.doctor_name, "Assigned Specialist");
        assert!(store.pending_consultations().iter().any(|c| c.id == id));

        store
            .apply(
                &hospital,
                Command::ReviewConsultation {
                    id: id.clone(),
                    status: ConsultationStatus::Confirmed,
                },
            )
            .unwrap();

        assert_eq!(
            store.consultations().get(&id).unwrap().status,
            ConsultationStatus::Confirmed
        );
        assert!(store.pending_consultations().iter().all(|c| c.id != id));
    }

    #[test]
    fn blank_symptoms_and_unknown_hospital_get_defaults() {
        let mut store = EntityStore::new();
        let details = NewConsultation {
            hospital_id: "h42".to_string(),
            symptoms: "   ".to_string(),
            kind: ConsultationType::InPerson,
            ..booking()
        };
        let created = store.add_consultation(&patient(), details).unwrap();
        assert_eq!(created.symptoms, "General Checkup");
        assert_eq!(created.hospital_name, "Hospital");
        assert_eq!(created.amount, 899);
    }

    #[test]
    fn reviewed_consultation_cannot_be_reviewed_again() {
        let mut store = EntityStore::new();
        let id = store.add_consultation(&patient(), booking()).unwrap().id.clone();
        store
            .update_consultation_status(&id, ConsultationStatus::Cancelled)
            .unwrap();

        let err = store
            .update_consultation_status(&id, ConsultationStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));
        assert_eq!(
            store.consultations().get(&id).unwrap().status,
            ConsultationStatus::Cancelled
        );
    }

    #[test]
    fn ride_walks_through_dispatch_and_leaves_feeds() {
        let mut store = EntityStore::new();
        let driver = identity("d1", "Ravi", Role::Driver);

        let id = store
            .add_ride(&patient(), NewRide { vehicle: VehicleType::Ambulance })
            .id
            .clone();
        let ride = store.rides().get(&id).unwrap();
        assert_eq!(ride.status, RideStatus::Requested);
        assert_eq!(ride.eta_minutes, 12);
        assert!(ride.driver_name.is_none());
        assert_eq!(store.open_rides().len(), 1);

        for status in [RideStatus::EnRoute, RideStatus::PickedUp, RideStatus::Completed] {
            let outcome = store
                .apply(&driver, Command::AdvanceRide { id: id.clone(), status })
                .unwrap();
            assert_eq!(outcome, Outcome::Updated(id.clone()));
            assert_eq!(store.rides().get(&id).unwrap().status, status);
            if status == RideStatus::EnRoute {
                assert_eq!(store.rides().get(&id).unwrap().driver_name.as_deref(), Some("Ravi"));
                assert!(store.open_rides().is_empty());
                assert_eq!(store.active_ride_for("Ravi").map(|r| r.id.as_str()), Some(id.as_str()));
            }
        }

        assert!(store.open_rides().is_empty());
        assert!(store.active_emergencies().is_empty());
        assert!(store.active_ride_for("Ravi").is_none());
    }

    #[test]
    fn only_the_bound_driver_advances_a_ride() {
        let mut store = EntityStore::new();
        let id = store
            .add_ride(&patient(), NewRide { vehicle: VehicleType::Bike })
            .id
            .clone();
        store.update_ride_status(&id, RideStatus::EnRoute, "Ravi").unwrap();

        let err = store
            .update_ride_status(&id, RideStatus::PickedUp, "Meena")
            .unwrap_err();
        assert_eq!(err, StoreError::NotAssignedDriver { id: id.clone() });

        let ride = store.rides().get(&id).unwrap();
        assert_eq!(ride.status, RideStatus::EnRoute);
        assert_eq!(ride.driver_name.as_deref(), Some("Ravi"));
    }

    #[test]
    fn completed_ride_cannot_be_requested_again() {
        let mut store = EntityStore::new();
        let id = store
            .add_ride(&patient(), NewRide { vehicle: VehicleType::Car })
            .id
            .clone();
        for status in [RideStatus::EnRoute, RideStatus::PickedUp, RideStatus::Completed] {
            store.update_ride_status(&id, status, "Ravi").unwrap();
        }
        assert!(store
            .update_ride_status(&id, RideStatus::Requested, "Ravi")
            .is_err());
    }

    #[test]
    fn order_advances_one_step_at_a_time() {
        let mut store = EntityStore::new();
        let pharmacy = identity("ph1", "Counter", Role::Pharmacy);
        let id = store.add_order(&patient(), prescription()).unwrap().id.clone();
        assert_eq!(store.orders().get(&id).unwrap().status, OrderStatus::Placed);
        assert_eq!(store.orders().get(&id).unwrap().items.len(), 3);

        let skip = store.apply(
            &pharmacy,
            Command::AdvanceOrder {
                id: id.clone(),
                status: OrderStatus::Delivered,
            },
        );
        assert!(matches!(skip, Err(StoreError::IllegalTransition { .. })));
        assert_eq!(store.orders().get(&id).unwrap().status, OrderStatus::Placed);

        for status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered] {
            store
                .apply(&pharmacy, Command::AdvanceOrder { id: id.clone(), status })
                .unwrap();
        }
        assert_eq!(store.orders().get(&id).unwrap().status, OrderStatus::Delivered);
        assert!(store.active_orders().is_empty());
    }

    #[test]
    fn order_without_items_is_rejected() {
        let mut store = EntityStore::new();
        let err = store
            .add_order(
                &patient(),
                NewOrder {
                    items: Vec::new(),
                    total_amount: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err, StoreError::MissingField { field: "items" });
        assert!(store.orders().is_empty());
    }

    #[test]
    fn unknown_id_is_a_silent_no_op() {
        let mut store = EntityStore::with_demo_data();
        let before = store.consultations().all().to_vec();
        let hospital = identity("h-staff", "Front Desk", Role::Hospital);
        let outcome = store
            .apply(
                &hospital,
                Command::ReviewConsultation {
                    id: "missing".to_string(),
                    status: ConsultationStatus::Confirmed,
                },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored("missing".to_string()));
        assert_eq!(store.consultations().all(), before.as_slice());
    }

    #[test]
    fn commands_are_checked_against_the_actor_role() {
        let mut store = EntityStore::new();
        let driver = identity("d1", "Ravi", Role::Driver);
        let err = store
            .apply(&driver, Command::PlaceOrder(prescription()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden { role: Role::Driver, .. }));
        assert!(store.orders().is_empty());
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut store = EntityStore::new();
        let ids: Vec<String> = (0..50)
            .map(|_| store.add_ride(&patient(), NewRide { vehicle: VehicleType::Car }).id.clone())
            .collect();
        let numeric: Vec<i128> = ids.iter().map(|id| id.parse().unwrap()).collect();
        assert!(numeric.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn patient_views_only_show_their_own_records() {
        let mut store = EntityStore::with_demo_data();
        let other = identity("p2", "Kiran", Role::Patient);
        store.add_consultation(&patient(), booking()).unwrap();
        store.add_consultation(&other, booking()).unwrap();
        store.add_order(&other, prescription()).unwrap();

        assert_eq!(store.consultations_for("p1").len(), 1);
        assert_eq!(store.consultations_for("p2").len(), 1);
        assert!(store.orders_for("p1").is_empty());
        assert_eq!(store.orders_for("p2").len(), 1);
    }
}
