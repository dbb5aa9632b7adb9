pub mod config_io;
pub mod desk_io;
pub mod recovery;
pub mod store;
