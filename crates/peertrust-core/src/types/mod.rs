mod decision;
mod scope;
mod settings;
mod thumbprint;

pub use decision::*;
pub use scope::*;
pub use settings::*;
pub use thumbprint::*;
