//! Binary-side test suite: exercises the two loops end to end against mock
//! adapters, with real (short) timings and the watch-based shutdown.

mod pipeline_tests;
