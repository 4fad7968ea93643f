mod global_table_test;
mod lifecycle_test;
