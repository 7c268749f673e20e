//! sea-orm entities for the group tables and the host tables they join.

pub mod group_resource;
pub mod group_user;
pub mod groups;
pub mod resource;
pub mod users;
