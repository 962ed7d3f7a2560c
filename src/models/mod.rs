pub mod appointment;
pub mod barber;
pub mod review;
pub mod user;

pub use appointment::{
    Appointment, AppointmentStatus, CancelledBy, PaymentStatus, ServiceSnapshot,
};
pub use barber::{BarberProfile, Coordinates, DayHours, Location, Service, WorkingHours};
pub use review::Review;
pub use user::Role;
