pub mod query_runner;
pub mod schema_seeder;
