pub mod activations;
pub mod layers;
pub mod loss;
mod mlp;

pub use mlp::Mlp;
