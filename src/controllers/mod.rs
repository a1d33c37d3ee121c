pub mod admin_controller;
pub mod contact_controller;
pub mod review_controller;
