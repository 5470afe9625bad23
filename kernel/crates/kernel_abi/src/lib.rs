#![no_std]

mod errno;

pub use errno::*;
