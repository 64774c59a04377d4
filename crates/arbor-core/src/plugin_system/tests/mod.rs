pub mod bean_tests;
pub mod classpath_tests;
pub mod registry_tests;
pub mod validator_tests;
pub mod version_tests;
