//! C extension build system.
//!
//! This module turns extension targets into compiler and linker commands,
//! plans them, and runs them against the host toolchain.

pub mod context;
pub mod executor;
pub mod fingerprint;
pub mod native;
pub mod plan;
pub mod toolchain;

pub use context::BuildContext;
pub use executor::{BuildExecutor, BuildProgress};
pub use native::NativeBuilder;
pub use plan::BuildPlan;
pub use toolchain::{
    detect_toolchain, CommandSpec, GccToolchain, MsvcToolchain, Toolchain, ToolchainPlatform,
};
