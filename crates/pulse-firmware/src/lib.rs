//! ESP32-S3 firmware-specific modules for the pulse logger
//!
//! This crate binds the `pulse-core` collaborator traits to real
//! peripherals: UART0 carries the record stream to the host, the system
//! timer backs the seconds clock, and a oneshot ADC read backs the GSR
//! channel. Logging goes over RTT so it never mixes with the record stream.

#![no_std]

pub mod board;
pub mod peripherals;
