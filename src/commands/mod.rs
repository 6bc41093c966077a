// Membership sync and directory rendering
pub mod sync;
