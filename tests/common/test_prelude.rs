// common/test_prelude.rs

// Re-export commonly used items for integration tests.
#![allow(unused_imports)]
pub use assert_cmd::Command;
pub use predicates::prelude::*;
pub use predicates::str::contains;
pub use ue_buildlog::prelude::*;
