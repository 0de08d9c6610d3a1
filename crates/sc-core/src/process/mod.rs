//! Process checks on deployed units.

pub mod discovery;
pub mod validate;

pub use discovery::{get_process_id_list, get_unit_process_ids, pidof_command};
pub use validate::validate_unit_process_ids;
