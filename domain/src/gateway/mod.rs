pub mod object_storage;
pub mod operation;
pub mod speechkit;
