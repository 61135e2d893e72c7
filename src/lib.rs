pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod fs_ops;
pub mod launch;
pub mod lock;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod releases;
pub mod shortcuts;
pub mod state;
