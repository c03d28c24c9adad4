//! CourseStat - group-by dashboards for course exports
//!
//! Loads attendance, quiz, video watch, task and score exports, groups the
//! rows by an organizational dimension (school, department, major, class,
//! teacher or course), computes counts, rates and score/watch statistics per
//! group, and ranks the groups.
//!
//! ```rust,no_run
//! use coursestat::config::Config;
//! use coursestat::dashboard::{build_report, DashboardRequest};
//! use coursestat::rules::ReportKind;
//!
//! fn main() -> coursestat::error::Result<()> {
//!     let table = coursestat::loader::load_csv(std::path::Path::new("出勤.csv"))?;
//!     let request = DashboardRequest::new(ReportKind::Attendance);
//!     let report = build_report(&table, &request, &Config::default())?;
//!     println!("{}", coursestat::report::generate_markdown_report(&report));
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod rules;

pub use error::{ReportError, Result};
