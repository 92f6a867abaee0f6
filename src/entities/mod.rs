pub mod prelude;

pub mod facilities;
pub mod resource_reports;
pub mod users;
