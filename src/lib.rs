//! Public library API for decoding DirectX `.x` model files.

/// Header sniffing, decompression, template-driven decoding and mesh assembly.
pub mod xof;
