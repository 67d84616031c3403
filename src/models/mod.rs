pub mod booking;
pub mod dialog;
pub mod time_slot;
pub mod user;

pub use booking::Booking;
pub use dialog::BookingDialog;
pub use time_slot::TimeSlot;
pub use user::User;
