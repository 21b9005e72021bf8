//! Package archive format: a self-describing `.alp` file holding a
//! metadata document and a checksum-bound compressed payload.

mod archive;

pub use archive::Package;
