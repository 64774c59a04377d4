pub mod order_entry_tests;
