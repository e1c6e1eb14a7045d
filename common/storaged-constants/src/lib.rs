#![no_std]

pub mod bus;
pub mod env;
pub mod iface;
pub mod options;
pub mod status;
