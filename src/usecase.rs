mod install;
mod matcher;
mod registry;
mod remediate;
mod resolver;

pub use install::{InstallMode, Installer, YarnInstaller};
pub use registry::NpmRegistryResolver;
pub use remediate::remediate;
