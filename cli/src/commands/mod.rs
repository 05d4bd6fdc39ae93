mod helpers;
mod log;
mod profile;
mod search;
mod summary;

pub(crate) use helpers::parse_day;
pub(crate) use log::{cmd_clear, cmd_log, cmd_reset, cmd_scan};
pub(crate) use profile::{cmd_profile_set, cmd_profile_show};
pub(crate) use search::{cmd_catalog, cmd_search};
pub(crate) use summary::{cmd_entries, cmd_summary};
