//! Host-side integration tests for the bluebox core

#[cfg(test)]
mod dispatch_tests;
#[cfg(test)]
mod memory_tests;
#[cfg(test)]
mod decoder_tests;
#[cfg(test)]
mod synth_tests;
#[cfg(test)]
mod scenario_tests;
