#[path = "api_test.rs"]
mod api_test;

#[path = "workflow_test.rs"]
mod workflow_test;
