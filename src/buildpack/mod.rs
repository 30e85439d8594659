//! Buildpack discovery, selection and the detect/compile/release contract

pub mod contract;
pub mod release;
pub mod resolver;

pub use contract::{Buildpack, BuildpackContractRunner, Phase};
pub use release::{ReleaseMetadata, ReleaseParseError};
pub use resolver::{BuildpackOrigin, BuildpackResolver, SelectedBuildpack};
