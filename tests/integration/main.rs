//! Integration test target

mod e2e_test;
mod feed_test;
mod pipeline_test;
