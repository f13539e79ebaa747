// Concrete storage backend adapters
pub mod azure_datalake;
pub mod network_folder;
