pub mod rsvp;
pub mod update;

pub use rsvp::{Attendance, NewRsvp, RsvpEntry};
pub use update::{newest_first, UpdateEntry};
