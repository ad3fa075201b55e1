pub mod department;
pub mod inform;
pub mod leave_request;
pub mod leave_type;
pub mod user;
