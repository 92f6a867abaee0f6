pub use super::facilities::Entity as Facilities;
pub use super::resource_reports::Entity as ResourceReports;
pub use super::users::Entity as Users;
