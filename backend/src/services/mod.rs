//! Business logic services for the cafeteria backend

pub mod attendance;
pub mod customer;
pub mod employee;
pub mod product;
pub mod reporting;
pub mod sale;
pub mod schedule;
pub mod seed;
pub mod supply;

pub use attendance::AttendanceService;
pub use customer::CustomerService;
pub use employee::EmployeeService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use sale::SaleService;
pub use schedule::ScheduleService;
pub use seed::SeedService;
pub use supply::SupplyService;
