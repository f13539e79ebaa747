// Staging related constants
pub const STAGING_DIR_PREFIX: &str = "filetransfer-";
pub const STAGING_FALLBACK_NAME: &str = "staged";
pub const STAGING_DIR_ENV: &str = "FILETRANSFER_STAGING_DIR";

// Copy related constants
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

// Log targets
pub const AZURE_DATALAKE_LOG_TARGET: &str = "filetransfer::azure_datalake";
pub const NETWORK_FOLDER_LOG_TARGET: &str = "filetransfer::network_folder";
pub const TRANSFER_LOG_TARGET: &str = "filetransfer::transfer";

// Backend parameter names
pub const PARAM_ACCOUNT_URL: &str = "account_url";
pub const PARAM_ACCOUNT_NAME: &str = "account_name";
pub const PARAM_CREDENTIAL: &str = "credential";
pub const PARAM_BASE_PATH: &str = "base_path";
