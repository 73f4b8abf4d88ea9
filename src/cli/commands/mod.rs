mod init;
mod migrate;
mod users;

pub use init::cmd_init;
pub use migrate::cmd_migrate;
pub use users::cmd_list_users;
