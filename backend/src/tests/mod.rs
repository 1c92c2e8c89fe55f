mod common;
mod handler_test;
