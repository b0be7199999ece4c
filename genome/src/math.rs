mod elementary;
mod hnf;

pub use hnf::HNF;
