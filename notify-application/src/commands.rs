pub mod lifecycle_commands;
pub mod notify_commands;
