//! Bus Jam Simulation Library
//!
//! The grid reachability and passenger/vehicle matching core of a bus jam
//! puzzle game. It runs headless; any renderer drives it through clicks and
//! ticks and reads back the events it emits.

pub mod simulation;
