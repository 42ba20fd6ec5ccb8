mod app_struct;
mod init;

pub use app_struct::App;
pub use init::controller_config;
