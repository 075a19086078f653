mod advisory;
mod descriptor;
mod error;
mod ident;
mod locator;
mod package;
mod project;
mod range;

pub use advisory::Advisory;
pub use descriptor::{Descriptor, DescriptorHash};
pub use error::ProjectError;
pub use ident::Ident;
pub use locator::{Locator, LocatorHash};
pub use package::Package;
pub use project::Project;
pub use range::VersionRange;
