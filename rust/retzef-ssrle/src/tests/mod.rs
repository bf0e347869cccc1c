mod segment_tests;
mod support;
mod update_tests;
