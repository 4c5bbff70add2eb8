pub mod permission;
pub mod role;
pub mod slug;
pub mod user;
