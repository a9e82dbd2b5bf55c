pub mod decode;
pub mod fit;
