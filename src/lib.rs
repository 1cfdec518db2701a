#[macro_use]
extern crate mem_macros;

pub mod app;
pub mod configuration;
pub mod device;
pub mod errors;
pub mod hasher;
pub mod pcr;
pub mod session;
pub mod tpm2;
pub mod trustroot;
