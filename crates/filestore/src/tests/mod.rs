mod helpers;
mod read_tests;
mod shift_tests;
