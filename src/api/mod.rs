pub mod home;
pub mod image;
pub mod inform;
pub mod leave_request;
pub mod staff;
