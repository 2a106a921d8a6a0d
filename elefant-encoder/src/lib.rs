//! Binary encoders for PostgreSQL parameters.
//!
//! Every encoder implements the two call protocol of [`Encoder`]: a sizing call that reports
//! how many bytes a value needs, followed by a writing call into a region of that size. This
//! lets a whole parameter list be sized, allocated once and then written, see
//! [`encode_parameters`].

mod error;
pub mod network_order;
mod parameters;
mod registry;
#[cfg(test)]
mod test_helpers;
mod types;
mod value;

pub use error::*;
pub use parameters::*;
pub use registry::*;
pub use types::*;
pub use value::Value;
