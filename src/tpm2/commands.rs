pub mod capability;
pub mod commands;
pub mod pcrextend;
pub mod pcrread;
pub mod run;
