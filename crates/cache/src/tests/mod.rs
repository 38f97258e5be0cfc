mod elements_tests;
mod helpers;
mod keyed_tests;
