pub mod roster_loader;

pub use roster_loader::{load_all_rosters, load_roster, parse_roster, ExamRoster, RosterStudent};
