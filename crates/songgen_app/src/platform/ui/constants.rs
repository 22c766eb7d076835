pub const COMMAND_PREFIX: char = ':';

pub const CMD_DOWNLOAD: &[&str] = &["download", "d"];
pub const CMD_RESET: &[&str] = &["reset", "r"];
pub const CMD_QUIT: &[&str] = &["quit", "q", "exit"];
pub const CMD_HELP: &[&str] = &["help", "h", "?"];

pub const PROGRESS_BAR_WIDTH: usize = 30;
