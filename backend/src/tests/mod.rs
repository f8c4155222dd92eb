// Common test utilities and shared test setup
//
// Executors, the engine and the job runner are exercised against the in-memory
// stores, queue and mail sender wired up by `helpers::TestContext`.

pub mod helpers;
