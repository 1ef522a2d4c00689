pub mod compose;
pub mod config_cmd;
pub mod recall;
