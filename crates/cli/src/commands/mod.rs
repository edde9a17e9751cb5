pub mod analyze;
pub mod init;
pub mod run;
pub mod toolchains;

pub use analyze::analyze_command;
pub use init::init_command;
pub use run::run_command;
pub use toolchains::toolchains_command;
