pub mod binary_mask;
pub mod block;
pub mod block_matcher;
pub mod boundary;
pub mod padding;
pub mod pixel;
pub mod renderer;
pub mod utils;
