/// Every element pair over the horizon given by the period theorems
mod direct;
pub use direct::DirectConvolution;
pub(crate) use direct::direct;

/// Transient and periodic parts convolved separately
mod isospeed;
pub use isospeed::{IsospeedConvolution, SuperIsospeedConvolution};

/// Through pseudo-inverses and the dual operator
mod inversion;
pub use inversion::InversionConvolution;
