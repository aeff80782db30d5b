pub mod fixtures;

#[cfg(test)]
mod finalize_tests;
#[cfg(test)]
mod session_tests;
#[cfg(test)]
mod transcript_tests;
