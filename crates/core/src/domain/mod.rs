pub mod request;
pub mod restaurant;
