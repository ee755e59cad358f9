pub mod collection;
pub mod collection_repository;
pub mod search;
