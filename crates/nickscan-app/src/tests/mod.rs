mod command_tests;
mod profile_tests;
