//! stackcheck common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Typed status snapshot and command/action result records
//! - Charm URL parsing
//! - Expected/actual process maps and PID expectations
//! - Ubuntu/OpenStack release table
//! - Common error types

pub mod charm;
pub mod error;
pub mod process;
pub mod release;
pub mod status;

pub use charm::extract_charm_name;
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use process::{ActualProcessMap, ExpectedProcessMap, PidExpectation};
pub use release::{get_ubuntu_release, openstack_release_for_series};
pub use status::{
    unit_application, ActionResult, ApplicationConfig, ApplicationStatus, CommandResult,
    ModelStatus, StatusInfo, SubordinateStatus, UnitInfo, UnitStatus,
};
